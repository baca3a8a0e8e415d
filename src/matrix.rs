
///A simple matrix struct. Used for the per-direction grids of link channels
///while wiring the mesh fabric.
#[derive(Debug)]
pub struct Matrix<T>
{
	data: Vec<T>,
	num_columns: usize,
}

impl<T> Matrix<T>
{
	///Read a matrix entry.
	pub fn get(&self,row:usize,column:usize) -> &T
	{
		&self.data[row*self.num_columns+column]
	}
	///Build a matrix calling `f` on each `(row,column)`. The entries must be
	///distinct objects, as with shared channel endpoints, so there is no
	///constructor from a cloned value.
	pub fn generate<F:FnMut(usize,usize)->T>(num_rows:usize,num_columns:usize,mut f:F) -> Matrix<T>
	{
		Matrix{
			data: (0..num_rows*num_columns).map(|index|f(index/num_columns,index%num_columns)).collect(),
			num_columns,
		}
	}
}

impl<T> IntoIterator for Matrix<T>
{
	type Item = T;
	type IntoIter = <Vec<T> as IntoIterator>::IntoIter;
	fn into_iter(self) -> <Self as IntoIterator>::IntoIter
	{
		self.data.into_iter()
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn generate_indexes_row_major()
	{
		let matrix = Matrix::generate(2,3,|row,column|(row,column));
		assert_eq!(*matrix.get(1,2),(1,2));
		assert_eq!(*matrix.get(0,1),(0,1));
		assert_eq!(matrix.into_iter().count(),6);
	}
}
