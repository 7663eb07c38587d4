/// Creates nested collections of variables from index tuples.
///
/// `(a, b, c).vars_with(f)` calls `f((i, j, k))` for every index in row-major order and
/// returns the handles as `v[i][j][k]`. Stops at the first error.
pub trait AddVars<V> {
    type Out;

    /// Create a variable with a closure
    fn vars_with<E, F: FnMut(Self) -> Result<V, E>>(&self, func: F) -> Result<Self::Out, E>
    where
        Self: Sized;
}

impl<V> AddVars<V> for usize {
    type Out = Vec<V>;

    fn vars_with<E, F: FnMut(Self) -> Result<V, E>>(&self, mut func: F) -> Result<Self::Out, E>
    where
        Self: Sized,
    {
        let mut vec = Vec::with_capacity(*self);
        for i in 0..*self {
            vec.push(func(i)?);
        }

        Ok(vec)
    }
}

impl<V> AddVars<V> for (usize, usize) {
    type Out = Vec<<usize as AddVars<V>>::Out>;

    fn vars_with<E, F: FnMut(Self) -> Result<V, E>>(&self, mut func: F) -> Result<Self::Out, E>
    where
        Self: Sized,
    {
        let mut out = Vec::with_capacity(self.0);
        for i in 0..self.0 {
            out.push(self.1.vars_with(|j| func((i, j)))?);
        }

        Ok(out)
    }
}

impl<V> AddVars<V> for (usize, usize, usize) {
    type Out = Vec<<(usize, usize) as AddVars<V>>::Out>;

    fn vars_with<E, F: FnMut(Self) -> Result<V, E>>(&self, mut func: F) -> Result<Self::Out, E>
    where
        Self: Sized,
    {
        let mut out = Vec::with_capacity(self.0);
        for i in 0..self.0 {
            out.push((self.1, self.2).vars_with(|(j, k)| func((i, j, k)))?)
        }

        Ok(out)
    }
}
