//! Field values as seen by validation rules.

/// A borrowed view of one field's value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// `None` in an `Option`.
    Absent,
    /// Any string-like value.
    Str(&'a str),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// A collection, represented by its length.
    Seq(usize),
}

impl<'a> FieldValue<'a> {
    /// Returns `true` for the zero value of the type.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match *self {
            Self::Absent => true,
            Self::Str(s) => s.is_empty(),
            Self::Int(n) => n == 0,
            Self::Uint(n) => n == 0,
            Self::Float(n) => n == 0.0,
            Self::Bool(b) => !b,
            Self::Seq(len) => len == 0,
        }
    }

    /// Returns the string when this is a string value.
    #[must_use]
    pub const fn as_str(self) -> Option<&'a str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Conversion of a struct field into a [`FieldValue`].
pub trait AsFieldValue {
    /// Returns the borrowed value.
    fn as_field_value(&self) -> FieldValue<'_>;
}

impl AsFieldValue for String {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Str(self)
    }
}

impl AsFieldValue for str {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Str(self)
    }
}

impl AsFieldValue for &str {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Str(self)
    }
}

impl AsFieldValue for bool {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Bool(*self)
    }
}

macro_rules! impl_as_field_value {
    ($variant:ident, $target:ty: $($ty:ty),*) => {
        $(
            impl AsFieldValue for $ty {
                fn as_field_value(&self) -> FieldValue<'_> {
                    FieldValue::$variant(<$target>::from(*self))
                }
            }
        )*
    };
}

impl_as_field_value!(Int, i64: i8, i16, i32, i64);
impl_as_field_value!(Uint, u64: u8, u16, u32, u64);
impl_as_field_value!(Float, f64: f32, f64);

impl AsFieldValue for usize {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Uint(*self as u64)
    }
}

impl AsFieldValue for isize {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Int(*self as i64)
    }
}

impl<T: AsFieldValue> AsFieldValue for Option<T> {
    fn as_field_value(&self) -> FieldValue<'_> {
        self.as_ref()
            .map_or(FieldValue::Absent, AsFieldValue::as_field_value)
    }
}

impl<T> AsFieldValue for Vec<T> {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Seq(self.len())
    }
}

impl<T> AsFieldValue for [T] {
    fn as_field_value(&self) -> FieldValue<'_> {
        FieldValue::Seq(self.len())
    }
}

/// One field of a record submitted for validation.
#[derive(Debug, Clone, Copy)]
pub struct Field<'a> {
    /// Key used in the field-error map.
    pub name: &'static str,
    /// Comma-separated rule list.
    pub rules: &'static str,
    /// The value.
    pub value: FieldValue<'a>,
}

impl<'a> Field<'a> {
    /// Creates a field entry.
    #[must_use]
    pub const fn new(name: &'static str, rules: &'static str, value: FieldValue<'a>) -> Self {
        Self { name, rules, value }
    }
}

/// A record whose fields can be validated.
///
/// Normally derived with `#[derive(Validate)]`; the fields are returned in
/// declaration order.
pub trait Validate {
    /// Returns the annotated fields.
    fn fields(&self) -> Vec<Field<'_>>;
}

impl<T: Validate + ?Sized> Validate for &T {
    fn fields(&self) -> Vec<Field<'_>> {
        (**self).fields()
    }
}
