/*!

The bounded flit FIFO behind each router input port.

*/

use std::collections::VecDeque;

use crate::Flit;

///A bounded FIFO of flits. Each router owns five of them, one per input direction.
///Capacity is the global `buffer_depth` knob. Overrunning either bound is a bug
///in the caller, not a recoverable condition, and panics.
#[derive(Clone,Debug)]
pub struct CircularBuffer
{
	depth: usize,
	queue: VecDeque<Flit>,
}

impl CircularBuffer
{
	pub fn new(depth:usize) -> CircularBuffer
	{
		CircularBuffer{
			depth,
			queue: VecDeque::with_capacity(depth),
		}
	}
	///Append a flit. The caller must have checked `is_full`.
	pub fn push(&mut self, flit:Flit)
	{
		if self.queue.len() >= self.depth
		{
			panic!("pushing into a full buffer");
		}
		self.queue.push_back(flit);
	}
	///Extract the oldest flit. The caller must have checked `is_empty`.
	pub fn pop(&mut self) -> Flit
	{
		self.queue.pop_front().expect("popping from an empty buffer")
	}
	///The oldest flit without extracting it.
	pub fn front(&self) -> Option<&Flit>
	{
		self.queue.front()
	}
	pub fn len(&self) -> usize
	{
		self.queue.len()
	}
	pub fn is_empty(&self) -> bool
	{
		self.queue.is_empty()
	}
	pub fn is_full(&self) -> bool
	{
		self.queue.len() == self.depth
	}
	///Drop every stored flit. Only used while the reset signal is asserted.
	pub fn clear(&mut self)
	{
		self.queue.clear();
	}
}
