use rand::Rng;
use std::fmt::{Display, Formatter};
use volt_driver::Value;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// One kind of call a worker issues on every loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Workload {
    /// `Insert(hello, world, language)`
    Write,
    /// `Select(language)`
    Read,
    /// `Results()`
    Results,
}

impl Workload {
    #[must_use]
    pub fn procedure(self) -> &'static str {
        match self {
            Workload::Write => "Insert",
            Workload::Read => "Select",
            Workload::Results => "Results",
        }
    }

    /// Parameters of this workload's call for `payload`.
    #[must_use]
    pub fn parameters(self, payload: &Payload) -> Vec<Value> {
        match self {
            Workload::Write => vec![
                Value::from(payload.hello.as_str()),
                Value::from(payload.world.as_str()),
                Value::from(payload.language.as_str()),
            ],
            Workload::Read => vec![Value::from(payload.language.as_str())],
            Workload::Results => Vec::new(),
        }
    }
}

impl Display for Workload {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Workload::Write => write!(f, "writes"),
            Workload::Read => write!(f, "reads"),
            Workload::Results => write!(f, "results"),
        }
    }
}

/// Values shared by every call of one loop, so a read finds the row the
/// write before it stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    pub hello: String,
    pub world: String,
    pub language: String,
}

impl Payload {
    /// `h<n>`, `w<n>` and `l<n>`
    #[must_use]
    pub fn numeric(sequence: u64) -> Self {
        Self {
            hello: format!("h{sequence}"),
            world: format!("w{sequence}"),
            language: format!("l{sequence}"),
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            hello: random_string(rng),
            world: random_string(rng),
            language: random_string(rng),
        }
    }
}

/// Between 1 and 19 lowercase letters.
pub fn random_string<R: Rng + ?Sized>(rng: &mut R) -> String {
    let length = rng.gen_range(1..20);
    (0..length)
        .map(|_| char::from(LETTERS[rng.gen_range(0..LETTERS.len())]))
        .collect()
}

/// Sequence number of a worker's loop. Workers interleave, so no two
/// workers produce the same number.
#[must_use]
pub fn sequence(iteration: u64, workers: u64, worker: u64) -> u64 {
    iteration * workers + worker
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_procedures() {
        assert_eq!(Workload::Write.procedure(), "Insert");
        assert_eq!(Workload::Read.procedure(), "Select");
        assert_eq!(Workload::Results.procedure(), "Results");
    }

    #[test]
    fn test_parameters() {
        let payload = Payload::numeric(7);

        assert_eq!(
            Workload::Write.parameters(&payload),
            [Value::from("h7"), Value::from("w7"), Value::from("l7")]
        );
        assert_eq!(Workload::Read.parameters(&payload), [Value::from("l7")]);
        assert!(Workload::Results.parameters(&payload).is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(Workload::Write.to_string(), "writes");
        assert_eq!(Workload::Read.to_string(), "reads");
        assert_eq!(Workload::Results.to_string(), "results");
    }

    #[test]
    fn test_random_string() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let value = random_string(&mut rng);
            assert!((1..20).contains(&value.len()));
            assert!(value.chars().all(|c| c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_random_payload() {
        let mut rng = StdRng::seed_from_u64(7);
        let payload = Payload::random(&mut rng);
        assert!(!payload.hello.is_empty());
        assert!(!payload.world.is_empty());
        assert!(!payload.language.is_empty());
    }

    #[test]
    fn test_sequences_are_unique_across_workers() {
        let workers = 3;
        let sequences: HashSet<u64> = (0..workers)
            .flat_map(|worker| (0..100).map(move |iteration| sequence(iteration, workers, worker)))
            .collect();
        assert_eq!(sequences.len(), 300);
        assert_eq!(sequence(0, 3, 2), 2);
        assert_eq!(sequence(4, 3, 1), 13);
    }
}
