use std::ops::{Add, Mul};

#[macro_export]
macro_rules! poly {
    ($($coef:expr),+) => {
	{
	    let p = vec![$($coef),+];
	    $crate::polynom::Polynom::from(p)
	}
    }
}

// [i] contains the coefficient for t^(i)
#[derive(Debug, PartialEq, Clone)]
pub struct Polynom<T>(Vec<T>);

impl<T> Polynom<T> {
    pub fn value<V>(&self, t: V) -> V
    where
        T: Copy,
        V: From<T> + Mul<Output = V> + Add<Output = V> + Copy + From<i8>,
    {
	if self.0.is_empty() {
	    return  V::from(0i8);
	}
        let mut sum = V::from(self.0[0]);
        let mut f = t;
        for p in &self.0[1..] {
            sum = sum + f * V::from(*p);
            f = f * t;
        }
        sum
    }

    pub fn len(&self) -> usize
    {
	self.0.len()
    }

    pub fn is_empty(&self) -> bool
    {
	self.0.is_empty()
    }
}

impl<T> From<&[T]> for Polynom<T>
    where T: Copy
{
    fn from(coef: &[T]) -> Polynom<T>
    {
	Polynom(Vec::from(coef))
    }
}

impl<T> From<Vec<T>> for Polynom<T>
    where T: Copy
{
    fn from(coef: Vec<T>) -> Polynom<T>
    {
	Polynom(coef)
    }
}

#[test]
fn test_value() {
    assert_eq!(poly!(2, 5, 3).value(2), 2 + 10 + 12);
    assert_eq!(poly!(2, 5, 3).value(3.0), 2.0 + 15.0 + 27.0);
    assert_eq!(poly!(2.0, 5.0, 3.0).value(2.0), 24.0);
}

#[test]
fn test_empty() {
    let p: Polynom<f64> = Polynom::from(Vec::new());
    assert!(p.is_empty());
    assert_eq!(p.value(3.0), 0.0);
}
