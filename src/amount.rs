use serde::{Deserialize, Serialize};
use std::fmt;

/// Points per currency unit when nothing else is configured.
pub const POINTS_PER_CURRENCY: i64 = 2;

macro_rules! integer_unit {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const ZERO: Self = $name(0);

            pub const fn new(value: i64) -> Self {
                $name(value)
            }

            pub const fn value(self) -> i64 {
                self.0
            }

            pub const fn is_zero(self) -> bool {
                self.0 == 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::ops::Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self::Output {
                $name(self.0 + rhs.0)
            }
        }

        impl std::ops::Sub for $name {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self::Output {
                $name(self.0 - rhs.0)
            }
        }

        impl std::ops::Neg for $name {
            type Output = Self;

            fn neg(self) -> Self::Output {
                $name(-self.0)
            }
        }

        impl std::ops::AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl std::ops::SubAssign for $name {
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold($name::ZERO, |acc, v| acc + v)
            }
        }
    };
}

integer_unit!(
    /// Chip value as counted at the table.
    Points
);

integer_unit!(
    /// Money owed or collected, the unit ledger lines are persisted in.
    Currency
);

/// Unit a working value is entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Points,
    Currency,
}

/// Conversion ratio: `points` points are worth `currency` currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    pub points: i64,
    pub currency: i64,
}

impl Default for Ratio {
    fn default() -> Self {
        Ratio {
            points: POINTS_PER_CURRENCY,
            currency: 1,
        }
    }
}

impl Ratio {
    pub fn is_valid(&self) -> bool {
        self.points > 0 && self.currency > 0
    }
}

/// Converts between points and currency at a fixed ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitConverter {
    ratio: Ratio,
}

impl UnitConverter {
    pub fn new(ratio: Ratio) -> Self {
        Self { ratio }
    }

    pub fn ratio(&self) -> Ratio {
        self.ratio
    }

    /// Truncates toward zero; an odd point value loses its half unit at 2:1.
    pub fn to_currency(&self, points: Points) -> Currency {
        Currency(points.0 * self.ratio.currency / self.ratio.points)
    }

    /// `None` when the conversion would drop a fraction of a currency unit.
    pub fn to_currency_exact(&self, points: Points) -> Option<Currency> {
        let scaled = points.0 * self.ratio.currency;
        (scaled % self.ratio.points == 0).then_some(Currency(scaled / self.ratio.points))
    }

    pub fn to_points(&self, currency: Currency) -> Points {
        Points(currency.0 * self.ratio.points / self.ratio.currency)
    }

    /// Express `amount`, held in `unit`, as points.
    pub fn points_of(&self, amount: i64, unit: Unit) -> Points {
        match unit {
            Unit::Points => Points(amount),
            Unit::Currency => self.to_points(Currency(amount)),
        }
    }

    /// Re-express `amount` from one unit into another.
    pub fn convert(&self, amount: i64, from: Unit, to: Unit) -> i64 {
        match (from, to) {
            (Unit::Points, Unit::Currency) => self.to_currency(Points(amount)).0,
            (Unit::Currency, Unit::Points) => self.to_points(Currency(amount)).0,
            _ => amount,
        }
    }
}
