//! Parameter value conversion for [`RequestBuilder::with_param`].
//!
//! [`RequestBuilder::with_param`]: crate::RequestBuilder::with_param

/// Values accepted as query/body parameters.
///
/// Numeric conversions go through `Display`, which is locale-independent in
/// Rust (`3.14f32` always formats as `"3.14"`).
pub trait ParamValue {
    fn into_param(self) -> String;
}

impl ParamValue for String {
    fn into_param(self) -> String {
        self
    }
}

impl ParamValue for &str {
    fn into_param(self) -> String {
        self.to_owned()
    }
}

macro_rules! impl_param_value_via_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ParamValue for $ty {
                fn into_param(self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_param_value_via_display!(bool, i32, i64, u32, u64, usize, f32, f64);
