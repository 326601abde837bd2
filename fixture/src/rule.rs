//! Seed-driven rules evaluated at the leaves of a [crate::Construct].

/// Absolute tolerance used when comparing single precision values.
pub const F32_TOLERANCE: f32 = 1e-5;

/// Absolute tolerance used when comparing double precision values.
pub const F64_TOLERANCE: f64 = 1e-9;

/// Position of a leaf inside a generated sample.
///
/// Outside of collections `index` is zero. Every array or sequence element shifts the index by
/// its (flattened) position, so leaf rules inside collections see `seed + index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub seed: i64,
    pub index: i64,
}

impl Cursor {
    /// Create a cursor at the root of a sample.
    pub const fn new(seed: i64) -> Self {
        Self { seed, index: 0 }
    }

    /// Return the cursor of the element at `index` of a collection.
    pub const fn at(self, index: usize) -> Self {
        Self {
            seed: self.seed,
            index: self.index.wrapping_add(index as i64),
        }
    }

    /// The integer leaf rules are evaluated on.
    pub const fn value(self) -> i64 {
        self.seed.wrapping_add(self.index)
    }
}

/// Parity predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    /// Returns whether `value` has this parity.
    pub const fn holds(self, value: i64) -> bool {
        let even = value.rem_euclid(2) == 0;
        match self {
            Self::Even => even,
            Self::Odd => !even,
        }
    }
}

/// Rule producing a scalar (boolean, integral, enum ordinal or floating point) from a cursor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    /// `value * mul + add` with wrapping arithmetic.
    Affine { mul: i64, add: i64 },
    /// `value mod modulus + add` using the euclidean remainder.
    Modulo { modulus: i64, add: i64 },
    /// `value * mul + add` evaluated in floating point.
    Scale { mul: f64, add: f64 },
    /// `1` (or `true`) when the value has the given parity.
    Parity(Parity),
}

impl Scalar {
    /// The value itself.
    pub const IDENTITY: Self = Self::Affine { mul: 1, add: 0 };

    pub const fn affine(mul: i64, add: i64) -> Self {
        Self::Affine { mul, add }
    }

    pub const fn modulo(modulus: i64, add: i64) -> Self {
        Self::Modulo { modulus, add }
    }

    pub const fn scale(mul: f64, add: f64) -> Self {
        Self::Scale { mul, add }
    }

    /// Evaluate the rule as a (not yet truncated) integer.
    ///
    /// A zero modulus evaluates to `add` so that every rule stays total.
    pub fn integer(&self, value: i64) -> i64 {
        match *self {
            Self::Affine { mul, add } => value.wrapping_mul(mul).wrapping_add(add),
            Self::Modulo { modulus, add } => value
                .checked_rem_euclid(modulus)
                .unwrap_or(0)
                .wrapping_add(add),
            Self::Scale { mul, add } => (value as f64 * mul + add) as i64,
            Self::Parity(parity) => parity.holds(value) as i64,
        }
    }

    /// Evaluate the rule in double precision.
    pub fn double(&self, value: i64) -> f64 {
        match *self {
            Self::Scale { mul, add } => value as f64 * mul + add,
            _ => self.integer(value) as f64,
        }
    }

    /// Evaluate the rule in single precision.
    pub fn single(&self, value: i64) -> f32 {
        match *self {
            Self::Scale { mul, add } => value as f32 * mul as f32 + add as f32,
            _ => self.integer(value) as f32,
        }
    }

    /// Evaluate the rule as a boolean.
    pub fn boolean(&self, value: i64) -> bool {
        match *self {
            Self::Parity(parity) => parity.holds(value),
            _ => self.integer(value) != 0,
        }
    }
}

/// Textual template interpolating `{seed}` and `{index}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Text(pub String);

impl Text {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Render the template at `cursor`, truncated to `bound` bytes (if any).
    pub fn render(&self, cursor: Cursor, bound: Option<usize>) -> String {
        let mut rendered = self
            .0
            .replace("{seed}", &cursor.seed.to_string())
            .replace("{index}", &cursor.index.to_string());
        if let Some(bound) = bound {
            if rendered.len() > bound {
                let mut end = bound;
                while !rendered.is_char_boundary(end) {
                    end -= 1;
                }
                rendered.truncate(end);
            }
        }
        rendered
    }
}

/// Rule producing the length of a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Length {
    Fixed(usize),
    /// `value mod modulus + add` using the euclidean remainder.
    Modulo { modulus: i64, add: i64 },
}

impl Length {
    pub fn evaluate(&self, value: i64) -> usize {
        match *self {
            Self::Fixed(len) => len,
            Self::Modulo { modulus, add } => {
                let len = value
                    .checked_rem_euclid(modulus)
                    .unwrap_or(0)
                    .saturating_add(add);
                usize::try_from(len).unwrap_or(0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_cursor_offsets() {
        let cursor = Cursor::new(7).at(3);
        assert_eq!(cursor.seed, 7);
        assert_eq!(cursor.index, 3);
        assert_eq!(cursor.value(), 10);
        assert_eq!(cursor.at(2).value(), 12);
    }

    #[test_case(Parity::Even, 4, true)]
    #[test_case(Parity::Even, 3, false)]
    #[test_case(Parity::Odd, -3, true)]
    #[test_case(Parity::Even, -4, true)]
    fn test_parity(parity: Parity, value: i64, expected: bool) {
        assert_eq!(parity.holds(value), expected);
    }

    #[test]
    fn test_affine_wraps() {
        let rule = Scalar::affine(i64::MAX, 2);
        assert_eq!(rule.integer(2), 0);
    }

    #[test]
    fn test_modulo_negative_stays_in_domain() {
        let rule = Scalar::modulo(3, 1);
        assert_eq!(rule.integer(-1), 3);
        assert_eq!(rule.integer(4), 2);
        assert_eq!(Scalar::modulo(0, 5).integer(42), 5);
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn test_scale_precision() {
        let rule = Scalar::scale(3.14159, 0.0);
        assert_eq!(rule.single(2), 2.0f32 * (3.14159f64 as f32));
        assert_eq!(rule.double(2), 2.0 * 3.14159);
    }

    #[test]
    fn test_text_render() {
        let text = Text::new("S_{seed}_{index}");
        assert_eq!(text.render(Cursor::new(4).at(2), None), "S_4_2");
        assert_eq!(text.render(Cursor::new(1234), Some(4)), "S_12");
    }

    #[test]
    fn test_length() {
        assert_eq!(Length::Fixed(3).evaluate(100), 3);
        assert_eq!(Length::Modulo { modulus: 10, add: 1 }.evaluate(7), 8);
        assert_eq!(Length::Modulo { modulus: 6, add: 0 }.evaluate(-1), 5);
    }
}
