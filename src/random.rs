//! Seeded linear-congruential generator.
//!
//! The constants and the seed conversion reproduce the classic `randomLcg` generator bit for bit:
//! the state is a 32-bit integer advanced as `state * 0x19660D + 0x3C6EF35F` (wrapping) and each
//! draw is `state / 2^32`. Changing any of this changes every tree ever drawn.

const MUL: u32 = 0x0019_660D;
const INC: u32 = 0x3C6E_F35F;
const EPS: f64 = 1.0 / 4_294_967_296.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcg {
    state: u32,
    calls: u64,
}

impl Lcg {
    /// Seeds the generator from a numeric seed value.
    ///
    /// Values in `[0, 1)` are scaled by `2^32`; everything else uses its absolute value. The
    /// result is truncated to a 32-bit integer the same way a bitwise `| 0` would, so huge or
    /// non-finite seeds wrap or collapse to zero instead of failing.
    pub fn new(seed: f64) -> Self {
        let scaled = if (0.0..1.0).contains(&seed) {
            seed / EPS
        } else {
            seed.abs()
        };
        Self {
            state: to_int32(scaled) as u32,
            calls: 0,
        }
    }

    /// Seeds the generator from a decimal digit string such as the output of
    /// [`crate::parser::encode`].
    pub fn from_digits(digits: &str) -> Self {
        Self::new(seed_from_digits(digits))
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_mul(MUL).wrapping_add(INC);
        self.calls += 1;
        EPS * self.state as f64
    }

    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }

    pub fn uniform_int(&mut self, min: f64, max: f64) -> i64 {
        self.uniform(min, max).floor() as i64
    }

    /// Number of values drawn so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

/// The value produced by the `call`-th draw (zero based) of a generator seeded with `seed`.
pub fn value_at(seed: f64, call: u64) -> f64 {
    let mut rng = Lcg::new(seed);
    let mut value = rng.next_f64();
    for _ in 0..call {
        value = rng.next_f64();
    }
    value
}

/// Reads a digit string as one (possibly huge) number. Empty or unparsable input reads as zero.
pub fn seed_from_digits(digits: &str) -> f64 {
    if digits.is_empty() {
        return 0.0;
    }
    digits.parse::<f64>().unwrap_or(0.0)
}

pub(crate) fn to_int32(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    let wrapped = value.trunc().rem_euclid(4_294_967_296.0);
    (wrapped as u64 as u32) as i32
}
