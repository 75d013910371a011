//! The network-interface contract this driver calls into at the lifecycle
//! transitions ground truth documents as `net_if_set_link_addr`,
//! `modem_ppp_attach`/`modem_ppp_release` and `net_if_carrier_on`/
//! `net_if_carrier_off`. Framing packets over the attached channel is
//! entirely the implementor's concern (an `embassy-net-ppp` device, most
//! likely); this driver only ever calls these five hooks, at the states
//! that document them.
use crate::cmux::DlciPipe;
use crate::status::Imei;

/// Implemented by the application's network-stack binding, the board-level
/// counterpart to [`crate::config::CellularConfig`].
pub trait PppInterface {
    /// Sets the PPP interface's link-layer address to the modem's IMEI.
    /// Called once, right after `RunInit`'s init script reports it.
    fn set_link_addr(&mut self, imei: &Imei);

    /// Hands the PPP interface the DLCI 2 data channel to frame packets
    /// over. Called every time dialling succeeds, including re-dials after
    /// a registration drop, without an intervening [`Self::release`] call
    /// on that path — matching ground truth's carrier-lost handler, which
    /// restarts dialling without first detaching PPP.
    fn attach(&mut self, dlci2: &mut DlciPipe<'_>);

    /// Detaches PPP from DLCI 2, on the way from `CarrierOn` to
    /// `CarrierOff`.
    fn release(&mut self);

    /// Brings the PPP interface's carrier up. Called every time the
    /// lifecycle (re-)enters `CarrierOn`.
    fn carrier_on(&mut self);

    /// Brings the PPP interface's carrier down, on the way from
    /// `CarrierOn` to `CarrierOff`.
    fn carrier_off(&mut self);
}
