// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Strongly typed indices for variables and constraints.
//!
//! `TypedIndex<T>` is a transparent `usize` tagged with a marker type so that
//! variable and constraint positions cannot be swapped by accident. The tag
//! provides a human readable name for `Display` and `Debug`.

/// A trait to tag typed indices with a name for display purposes.
pub trait TypedIndexTag: Clone {
    const NAME: &'static str;
}

/// A strongly typed index that is associated with a specific tag type `T`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypedIndex<T> {
    index: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T> TypedIndex<T> {
    /// Creates a new `TypedIndex` with the given `usize` index.
    #[inline(always)]
    pub const fn new(index: usize) -> Self {
        Self {
            index,
            _marker: std::marker::PhantomData,
        }
    }

    /// Returns the underlying `usize` index.
    #[inline(always)]
    pub const fn get(&self) -> usize {
        self.index
    }
}

impl<T> From<usize> for TypedIndex<T> {
    #[inline(always)]
    fn from(index: usize) -> Self {
        Self::new(index)
    }
}

impl<T> From<TypedIndex<T>> for usize {
    #[inline(always)]
    fn from(index: TypedIndex<T>) -> Self {
        index.index
    }
}

impl<T> std::fmt::Debug for TypedIndex<T>
where
    T: TypedIndexTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

impl<T> std::fmt::Display for TypedIndex<T>
where
    T: TypedIndexTag,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", T::NAME, self.index)
    }
}

/// A tag type for variable indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct VariableIndexTag;

impl TypedIndexTag for VariableIndexTag {
    const NAME: &'static str = "VariableIndex";
}

/// A typed index for decision variables (columns).
pub type VariableIndex = TypedIndex<VariableIndexTag>;

/// A tag type for constraint indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ConstraintIndexTag;

impl TypedIndexTag for ConstraintIndexTag {
    const NAME: &'static str = "ConstraintIndex";
}

/// A typed index for linear constraints (rows).
pub type ConstraintIndex = TypedIndex<ConstraintIndexTag>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_tag_name() {
        let v = VariableIndex::new(3);
        let c = ConstraintIndex::new(7);
        assert_eq!(format!("{}", v), "VariableIndex(3)");
        assert_eq!(format!("{:?}", c), "ConstraintIndex(7)");
    }

    #[test]
    fn test_usize_round_trip_and_ordering() {
        let a = VariableIndex::from(2);
        let b = VariableIndex::new(5);
        assert_eq!(usize::from(a), 2);
        assert!(a < b);
        assert_eq!(b.get(), 5);
    }
}
