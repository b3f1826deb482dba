//! Command-wrapping transform.
//!
//! Pure functions that inject the wrapper prefix into an outbound
//! command vector and extend its masking vector to match. Wrapping
//! never reorders or drops the original elements; it only prepends.
//!
//! Not idempotent by design: wrapping twice double-wraps. Callers wrap
//! exactly once per launch.

/// Prepend the wrapper prefix to a command vector.
///
/// The result has length `wrapper.len() + original.len()`; its first
/// elements equal `wrapper` in order and the rest equal `original` in
/// order.
pub fn wrap_command(original: &[String], wrapper: &[String]) -> Vec<String> {
    let mut wrapped = Vec::with_capacity(wrapper.len() + original.len());
    wrapped.extend_from_slice(wrapper);
    wrapped.extend_from_slice(original);
    wrapped
}

/// Extend a masking vector for a wrapped command.
///
/// The first `wrapper_len` entries equal `mask_wrapper` (all true when
/// the wrapper tokens must be hidden from the console, else all
/// false); the remaining entries equal the original masks
/// position-for-position. A caller that supplies no mask vector gets
/// all-false entries of length `original_len` for the original part.
pub fn wrap_masks(
    original: Option<&[bool]>,
    original_len: usize,
    wrapper_len: usize,
    mask_wrapper: bool,
) -> Vec<bool> {
    let mut masks = vec![mask_wrapper; wrapper_len];
    match original {
        Some(original) => masks.extend_from_slice(original),
        None => masks.extend(std::iter::repeat_n(false, original_len)),
    }
    masks
}
