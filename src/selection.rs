/*!

A selection strategy reduces the admissible set produced by the routing
function to the single output direction a head flit will reserve.

see [`new_selection_strategy`](fn.new_selection_strategy.html) for the names
accepted by the `selection_strategy` knob.

*/

use ::rand::{Rng,rngs::StdRng};

use crate::error::Error;
use crate::{Direction,DIRECTIONS};

///The closed set of selection strategies.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum SelectionStrategy
{
	///Uniform choice among the candidates, drawn from the simulation generator.
	Random,
	///Choose the candidate whose downstream buffer advertises the most free slots.
	BufferLevel,
	///Placeholder. Panics on invocation.
	Nopcar,
}

///Build a selection strategy from its configuration name.
pub fn new_selection_strategy(name:&str) -> Result<SelectionStrategy,Error>
{
	Ok(match name.to_ascii_uppercase().as_str()
	{
		"RANDOM" => SelectionStrategy::Random,
		"BUFFER_LEVEL" => SelectionStrategy::BufferLevel,
		"NOPCAR" => SelectionStrategy::Nopcar,
		_ => return Err(Error::UnknownSelectionStrategy(name.to_string())),
	})
}

///Reduce `candidates` to one direction. Singleton sets are returned directly,
///without consulting the strategy. `buffer_level_neighbor` holds the
///occupancies the neighbouring routers last advertised, `None` where no
///advertisement has been observed.
///
///Panics on an empty `candidates`: routing functions must never produce one.
pub fn select(strategy:SelectionStrategy, candidates:&[Direction], buffer_depth:usize, buffer_level_neighbor:&[Option<usize>;DIRECTIONS+1], rng:&mut StdRng) -> Direction
{
	if candidates.is_empty()
	{
		panic!("selection invoked with an empty admissible set");
	}
	if candidates.len() == 1
	{
		return candidates[0];
	}
	match strategy
	{
		SelectionStrategy::Random => candidates[rng.gen_range(0..candidates.len())],
		SelectionStrategy::BufferLevel =>
		{
			//A candidate matching the current maximum replaces it, so the last
			//one iterated wins ties. Documented behaviour.
			let mut max_free_positions = 0;
			let mut chosen = None;
			for &direction in candidates
			{
				let level = buffer_level_neighbor[direction.index()].unwrap_or(0);
				let free_positions = buffer_depth.saturating_sub(level);
				if free_positions >= max_free_positions
				{
					chosen = Some(direction);
					max_free_positions = free_positions;
				}
			}
			chosen.expect("buffer-level selection left no candidate")
		}
		SelectionStrategy::Nopcar => unimplemented!("the NoPCAR selection strategy is not implemented"),
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use ::rand::SeedableRng;

	const NO_LEVELS: [Option<usize>;DIRECTIONS+1] = [None;DIRECTIONS+1];

	#[test]
	fn singleton_bypasses_the_strategy()
	{
		let mut rng = StdRng::seed_from_u64(10u64);
		//Even the unimplemented strategy must not be reached for a singleton.
		let chosen = select(SelectionStrategy::Nopcar,&[Direction::East],4,&NO_LEVELS,&mut rng);
		assert_eq!(chosen,Direction::East);
	}

	#[test]
	fn random_is_reproducible()
	{
		let candidates = [Direction::North,Direction::East];
		let mut first_rng = StdRng::seed_from_u64(10u64);
		let mut second_rng = StdRng::seed_from_u64(10u64);
		for _ in 0..20
		{
			let a = select(SelectionStrategy::Random,&candidates,4,&NO_LEVELS,&mut first_rng);
			let b = select(SelectionStrategy::Random,&candidates,4,&NO_LEVELS,&mut second_rng);
			assert_eq!(a,b);
		}
	}

	#[test]
	fn buffer_level_prefers_the_freest_neighbour()
	{
		let mut rng = StdRng::seed_from_u64(10u64);
		let mut levels = [None;DIRECTIONS+1];
		levels[Direction::North.index()] = Some(3);
		levels[Direction::East.index()] = Some(1);
		let chosen = select(SelectionStrategy::BufferLevel,&[Direction::North,Direction::East],4,&levels,&mut rng);
		assert_eq!(chosen,Direction::East);
	}

	#[test]
	fn buffer_level_ties_go_to_the_last_candidate()
	{
		let mut rng = StdRng::seed_from_u64(10u64);
		let mut levels = [None;DIRECTIONS+1];
		levels[Direction::North.index()] = Some(2);
		levels[Direction::East.index()] = Some(2);
		let chosen = select(SelectionStrategy::BufferLevel,&[Direction::North,Direction::East],4,&levels,&mut rng);
		assert_eq!(chosen,Direction::East);
	}

	#[test]
	#[should_panic(expected="empty admissible set")]
	fn empty_input_panics()
	{
		let mut rng = StdRng::seed_from_u64(10u64);
		select(SelectionStrategy::Random,&[],4,&NO_LEVELS,&mut rng);
	}
}
