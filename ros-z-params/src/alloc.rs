//! Fallible allocation helpers.
//!
//! Buffers owned by the store or by a value under construction grow through
//! these helpers, so a failed reservation surfaces as
//! [`ParamError::OutOfMemory`](crate::ParamError::OutOfMemory) instead of
//! aborting the process.

use crate::error::Result;

/// Copy `text` into a freshly reserved `String`.
pub(crate) fn try_string(text: &str) -> Result<String> {
    let mut out = String::new();
    out.try_reserve_exact(text.len())?;
    out.push_str(text);
    Ok(out)
}

/// Push onto `vec`, growing it with amortized doubling.
pub(crate) fn try_push<T>(vec: &mut Vec<T>, item: T) -> Result<()> {
    if vec.len() == vec.capacity() {
        vec.try_reserve(1)?;
    }
    vec.push(item);
    Ok(())
}

/// Join `segments` with `sep`, optionally prefixing the separator.
pub(crate) fn try_join<'a, I>(segments: I, sep: char, leading: bool) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: Clone,
{
    let segments = segments.into_iter();
    let mut len: usize = 0;
    let mut count: usize = 0;
    for segment in segments.clone() {
        len += segment.len();
        count += 1;
    }
    let separators = if leading { count } else { count.saturating_sub(1) };
    let mut out = String::new();
    out.try_reserve_exact(len + separators * sep.len_utf8())?;
    for (i, segment) in segments.enumerate() {
        if leading || i > 0 {
            out.push(sep);
        }
        out.push_str(segment);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_join() {
        assert_eq!(try_join(["a", "b"], '/', true).unwrap(), "/a/b");
        assert_eq!(try_join(["a", "b", "c"], '.', false).unwrap(), "a.b.c");
        assert_eq!(try_join([] as [&str; 0], '.', false).unwrap(), "");
    }

    #[test]
    fn test_try_push_grows() {
        let mut v = Vec::new();
        for i in 0..100 {
            try_push(&mut v, i).unwrap();
        }
        assert_eq!(v.len(), 100);
        assert!(v.capacity() >= 100);
    }
}
