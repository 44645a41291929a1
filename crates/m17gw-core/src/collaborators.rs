//! Interface-only collaborator traits for the GPS/APRS extractor and the
//! stored voice-prompt announcer.
//!
//! Both are named in `spec.md` §1 as external collaborators the core only
//! needs to drive through a narrow interface; this crate defines that
//! interface (grounded on the method shapes of the upstream
//! `GPSHandler`/`Voice` classes) and ships a no-op default implementation.
//! A real APRS-IS client or stored-audio player is out of scope.

use m17gw_proto::Lsf;

/// Consumes GPS-subtype LSF/META payloads and turns them into APRS position
/// reports. A real implementation would decode the META field and forward
/// an APRS string to an `APRS-IS` uplink.
pub trait AprsSink {
    /// Inspect an inbound LSF; if its encryption-subtype marks it as a GPS
    /// payload, extract and forward the position report. No-op for any
    /// other subtype.
    fn process(&mut self, lsf: &Lsf);
}

/// A no-op [`AprsSink`] — the default when no GPS/APRS writer is
/// configured.
#[derive(Default)]
pub struct NullAprsSink;

impl AprsSink for NullAprsSink {
    fn process(&mut self, _lsf: &Lsf) {}
}

/// A producer that may also want to write frames to the modem — the
/// stored voice-prompt announcer in the upstream gateway. The session
/// controller asks it whether it currently holds the modem link busy (to
/// avoid talking over it) and polls it for frames exactly like any other
/// frame source.
pub trait ModemProducer {
    /// `true` while this producer is actively sending frames to the modem;
    /// the session controller withholds other frame writes while busy.
    fn is_busy(&self) -> bool;

    /// Advance any internal timers by `ms` milliseconds.
    fn clock(&mut self, ms: u64);

    /// Pop one frame to forward to the modem, if one is ready.
    fn read(&mut self) -> Option<Vec<u8>>;

    /// Begin (or queue) a new announcement.
    fn start(&mut self);

    /// Called when the link status becomes `Linked` to a named reflector,
    /// so an announcer could say "linked to X".
    fn linked_to(&mut self, _reflector_name: &str) {}

    /// Called when the link becomes unlinked, so an announcer could say
    /// "unlinked".
    fn unlinked(&mut self) {}
}

/// A no-op [`ModemProducer`] — always idle, never produces a frame. The
/// default when no voice-prompt player is configured.
#[derive(Default)]
pub struct NullModemProducer;

impl ModemProducer for NullModemProducer {
    fn is_busy(&self) -> bool {
        false
    }

    fn clock(&mut self, _ms: u64) {}

    fn read(&mut self) -> Option<Vec<u8>> {
        None
    }

    fn start(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_does_nothing() {
        let mut sink = NullAprsSink;
        let lsf = Lsf::from_bytes(&[0u8; m17gw_proto::lsf::LSF_LENGTH]);
        sink.process(&lsf);
    }

    #[test]
    fn null_producer_is_always_idle() {
        let mut producer = NullModemProducer;
        assert!(!producer.is_busy());
        producer.clock(1000);
        assert!(producer.read().is_none());
        producer.start();
        producer.linked_to("M17-USA");
        producer.unlinked();
    }
}
