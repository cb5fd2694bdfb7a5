use rand::rngs::OsRng;
use rand::Rng;

/// No 0/O or 1/I: ids get read aloud over the phone and written on paper.
const ID_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const ID_LENGTH: usize = 8;

/// Short human-readable appointment id, unique within a tenant for any
/// realistic volume (32^8 combinations from an OS-level CSPRNG). The store's
/// guarded create still refuses a collision outright.
pub fn generate_appointment_id() -> String {
    let mut rng = OsRng;
    (0..ID_LENGTH)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect()
}
