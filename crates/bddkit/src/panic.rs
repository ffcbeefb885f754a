//! Text extraction from panic payloads caught around handlers and hooks.

use std::any::Any;

/// Render a caught panic payload as a message.
///
/// `&str` and `String` payloads (what `panic!` produces) are returned as-is;
/// common scalar payloads are formatted; anything else yields a placeholder
/// naming the situation.
///
/// # Examples
///
/// ```
/// use bddkit::panic_message;
///
/// let caught = std::panic::catch_unwind(|| panic!("boom {}", 7)).unwrap_err();
/// assert_eq!(panic_message(caught.as_ref()), "boom 7");
/// ```
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        return (*text).to_string();
    }
    if let Some(text) = payload.downcast_ref::<String>() {
        return text.clone();
    }
    scalar_message(payload).unwrap_or_else(|| "panic with a non-string payload".to_string())
}

fn scalar_message(payload: &(dyn Any + Send)) -> Option<String> {
    macro_rules! try_scalars {
        ($($ty:ty),+ $(,)?) => {
            $(
                if let Some(value) = payload.downcast_ref::<$ty>() {
                    return Some(value.to_string());
                }
            )+
        };
    }
    try_scalars!(i32, i64, u32, u64, usize, isize, bool, char, f64);
    None
}
