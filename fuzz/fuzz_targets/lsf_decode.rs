//! Fuzz target for `Lsf` bit accessors over arbitrary 28-byte inputs.
//!
//! `Lsf::from_bytes` is infallible for any fixed-size array, but its
//! bit-field accessors (`data_type`, `encryption_type`,
//! `encryption_subtype`, `can`) interpret arbitrary bit patterns; this
//! exercises all of them together to catch any future arithmetic or
//! indexing mistake.

#![no_main]

use libfuzzer_sys::fuzz_target;
use m17gw_proto::lsf::{Lsf, LSF_LENGTH};

fuzz_target!(|data: &[u8]| {
    if data.len() < LSF_LENGTH {
        return;
    }
    let mut bytes = [0u8; LSF_LENGTH];
    bytes.copy_from_slice(&data[..LSF_LENGTH]);

    let lsf = Lsf::from_bytes(&bytes);
    let _ = lsf.is_packet();
    let _ = lsf.data_type();
    let _ = lsf.encryption_type();
    let _ = lsf.encryption_subtype();
    let _ = lsf.can();
    let _ = lsf.dest();
    let _ = lsf.source();
    let _ = lsf.meta();
    assert_eq!(lsf.to_bytes(), bytes);
});
