//! Session identifiers.
//!
//! An id is a sortable UTC timestamp prefix followed by a random suffix:
//!
//! ```text
//! 20260115-093012-k3x9qa
//! ```
//!
//! Randomness comes from the OS CSPRNG through `uuid`'s v4 generator.
//! Ids handed out during the current second are remembered, so two sessions
//! created in the same second can never share an id. Older ids carry an
//! older prefix and can no longer collide, so they are forgotten.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock, PoisonError};

use jiff::{Timestamp, tz::TimeZone};
use uuid::Uuid;

/// Length of the random suffix on generated ids.
pub const SUFFIX_LEN: usize = 6;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Suffixes already issued under the current timestamp prefix.
#[derive(Default)]
struct Issued {
    prefix: String,
    suffixes: HashSet<String>,
}

impl Issued {
    /// Draws suffixes until one is free under `prefix`.
    ///
    /// If the wall clock steps backwards, ids keep the latest prefix seen.
    fn claim(&mut self, prefix: String) -> String {
        if prefix > self.prefix {
            self.suffixes.clear();
            self.prefix = prefix;
        }
        loop {
            let suffix = random_string(SUFFIX_LEN);
            if self.suffixes.insert(suffix.clone()) {
                return format!("{}{suffix}", self.prefix);
            }
        }
    }
}

fn issued() -> &'static Mutex<Issued> {
    static ISSUED: OnceLock<Mutex<Issued>> = OnceLock::new();
    ISSUED.get_or_init(|| Mutex::new(Issued::default()))
}

/// Generates an id unique within this process.
pub fn generate_id() -> String {
    // A poisoned registry still holds a valid set of strings.
    let mut issued = issued().lock().unwrap_or_else(PoisonError::into_inner);
    issued.claim(timestamp_prefix(Timestamp::now()))
}

/// A random lowercase alphanumeric string of `len` characters.
pub fn random_string(len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        for (i, byte) in Uuid::new_v4().as_bytes().iter().enumerate() {
            if out.len() == len {
                break;
            }
            // Bytes 6 and 8 carry the version and variant bits.
            if i == 6 || i == 8 {
                continue;
            }
            // Only values below 252 (7 * 36) map evenly onto the alphabet.
            if *byte < 252 {
                out.push(char::from(ALPHABET[usize::from(*byte) % ALPHABET.len()]));
            }
        }
    }
    out
}

fn timestamp_prefix(now: Timestamp) -> String {
    now.to_zoned(TimeZone::UTC)
        .strftime("%Y%m%d-%H%M%S-")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_utc_date_and_time() {
        let ts: Timestamp = "2024-03-05T07:08:09Z".parse().unwrap();
        assert_eq!(timestamp_prefix(ts), "20240305-070809-");
    }

    #[test]
    fn id_has_prefix_and_suffix() {
        let id = generate_id();
        let (prefix, suffix) = id.split_at(id.len() - SUFFIX_LEN);

        assert_eq!(prefix.len(), "YYYYMMDD-HHMMSS-".len());
        assert!(prefix.ends_with('-'));
        assert!(suffix.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<String> = (0..500).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn registry_forgets_previous_second() {
        let mut issued = Issued::default();

        let first = issued.claim("20240305-070809-".into());
        issued.claim("20240305-070809-".into());
        assert_eq!(issued.suffixes.len(), 2);

        let next = issued.claim("20240305-070810-".into());
        assert_eq!(issued.suffixes.len(), 1);
        assert!(first.starts_with("20240305-070809-"));
        assert!(next.starts_with("20240305-070810-"));
    }

    #[test]
    fn registry_keeps_latest_prefix_when_clock_steps_back() {
        let mut issued = Issued::default();
        issued.claim("20240305-070810-".into());

        let id = issued.claim("20240305-070809-".into());

        assert!(id.starts_with("20240305-070810-"));
        assert_eq!(issued.suffixes.len(), 2);
    }

    #[test]
    fn registry_never_repeats_within_a_second() {
        let mut issued = Issued::default();
        let ids: HashSet<String> = (0..500)
            .map(|_| issued.claim("20240305-070809-".into()))
            .collect();

        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn random_string_honours_length() {
        assert_eq!(random_string(0), "");
        assert_eq!(random_string(6).len(), 6);
        // Longer than one uuid's worth of bytes.
        assert_eq!(random_string(40).len(), 40);
    }

    #[test]
    fn random_strings_differ() {
        assert_ne!(random_string(16), random_string(16));
    }
}
