use crate::meter::{AverageMeter, StopwatchMeter, TimeMeter};

/// A plain number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
}

impl Number {
    /// The value as a float.
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }
}

/// Plain value of a tensor.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorValue {
    /// Floating point scalar.
    Float(f64),
    /// Integer scalar.
    Int(i64),
    /// Flattened values of a tensor with more than one element.
    List(Vec<f64>),
}

impl TensorValue {
    /// The value of a single element tensor.
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Int(value) => Some(*value as f64),
            Self::List(values) if values.len() == 1 => Some(values[0]),
            Self::List(_) => None,
        }
    }
}

/// A statistic reported by the training loop.
#[derive(Debug, Clone)]
pub enum Stat {
    /// A plain number.
    Number(Number),
    /// An averaging meter.
    Average(AverageMeter),
    /// A rate meter.
    Time(TimeMeter),
    /// A stopwatch meter.
    Stopwatch(StopwatchMeter),
    /// The plain value of a tensor.
    Tensor(TensorValue),
    /// Any other value, displayed as is.
    Other(String),
}

impl Stat {
    /// The value when the statistic is a plain number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(number.to_f64()),
            _ => None,
        }
    }
}

macro_rules! stat_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Stat {
                fn from(value: $ty) -> Self {
                    Self::Number(Number::Int(value.into()))
                }
            }
        )*
    };
}

macro_rules! stat_from_uint {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Stat {
                fn from(value: $ty) -> Self {
                    let number = i64::try_from(value)
                        .map(Number::Int)
                        .unwrap_or(Number::Float(value as f64));
                    Self::Number(number)
                }
            }
        )*
    };
}

stat_from_int!(i32, i64, u32);
stat_from_uint!(u64, usize);

impl From<f32> for Stat {
    fn from(value: f32) -> Self {
        Self::Number(Number::Float(value as f64))
    }
}

impl From<f64> for Stat {
    fn from(value: f64) -> Self {
        Self::Number(Number::Float(value))
    }
}

impl From<AverageMeter> for Stat {
    fn from(meter: AverageMeter) -> Self {
        Self::Average(meter)
    }
}

impl From<TimeMeter> for Stat {
    fn from(meter: TimeMeter) -> Self {
        Self::Time(meter)
    }
}

impl From<StopwatchMeter> for Stat {
    fn from(meter: StopwatchMeter) -> Self {
        Self::Stopwatch(meter)
    }
}

impl From<TensorValue> for Stat {
    fn from(value: TensorValue) -> Self {
        Self::Tensor(value)
    }
}

impl From<&str> for Stat {
    fn from(value: &str) -> Self {
        Self::Other(value.to_string())
    }
}

impl From<String> for Stat {
    fn from(value: String) -> Self {
        Self::Other(value)
    }
}

/// Statistics reported at one step, in display order.
///
/// Keys are unique: inserting an existing key replaces its value and keeps its position.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    entries: Vec<(String, Stat)>,
}

impl Stats {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a statistic, returning the previous value of the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Stat>) -> Option<Stat> {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(name, _)| *name == key) {
            Some((_, current)) => Some(core::mem::replace(current, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Insert a statistic and return the record.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Stat>) -> Self {
        self.insert(key, value);
        self
    }

    /// The statistic of a key.
    pub fn get(&self, key: &str) -> Option<&Stat> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of statistics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the statistics in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Stat)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Stats
where
    K: Into<String>,
    V: Into<Stat>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut stats = Self::new();
        iter.into_iter().for_each(|(key, value)| {
            stats.insert(key, value);
        });
        stats
    }
}
