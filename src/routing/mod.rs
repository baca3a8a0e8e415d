/*!

A routing maps (input direction, current node, source, destination) to a
non-empty ordered set of admissible output directions; a selection strategy
then reduces that set to the one direction the head flit reserves.

All algorithms operate on mesh coordinates with `y` growing southward. Every
one of them answers `{Local}` when the destination is the current node, before
any algorithm-specific rule applies.

see [`new_routing_algorithm`](fn.new_routing_algorithm.html) for the names
accepted by the `routing_algorithm` knob.

*/

///Contains GlobalRoutingTable, NodeRoutingTable and the table file loader.
pub mod table;

use crate::error::Error;
use crate::{Coordinate,Direction};

pub use self::table::{GlobalRoutingTable,NodeRoutingTable};

///The closed set of routing algorithms.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum RoutingAlgorithm
{
	///Dimension-order: exhaust the x offset, then the y offset. Deterministic, deadlock-free.
	Xy,
	///Westward traffic is routed deterministically; eastward traffic may adapt. No turn into west.
	WestFirst,
	///Northward moves only as the last leg of a route.
	NorthLast,
	///The negative-axis steps (west, north) are taken before any positive one.
	NegativeFirst,
	///Turn restrictions by the parity of the current column.
	OddEven,
	///Both profitable directions whenever the destination is off-row and off-column.
	FullyAdaptive,
	///Look the admissible set up in a table loaded at startup.
	TableBased,
	///Placeholder. Panics on invocation.
	Dyad,
	///Placeholder. Panics on invocation.
	LookAhead,
	///Placeholder. Panics on invocation.
	Nopcar,
}

///Build a routing algorithm from its configuration name.
pub fn new_routing_algorithm(name:&str) -> Result<RoutingAlgorithm,Error>
{
	Ok(match name.to_ascii_uppercase().as_str()
	{
		"XY" => RoutingAlgorithm::Xy,
		"WEST_FIRST" => RoutingAlgorithm::WestFirst,
		"NORTH_LAST" => RoutingAlgorithm::NorthLast,
		"NEGATIVE_FIRST" => RoutingAlgorithm::NegativeFirst,
		"ODD_EVEN" => RoutingAlgorithm::OddEven,
		"FULLY_ADAPTIVE" => RoutingAlgorithm::FullyAdaptive,
		"RTABLE_BASED" => RoutingAlgorithm::TableBased,
		"DYAD" => RoutingAlgorithm::Dyad,
		"LOOK_AHEAD" => RoutingAlgorithm::LookAhead,
		"NOPCAR" => RoutingAlgorithm::Nopcar,
		_ => return Err(Error::UnknownRoutingAlgorithm(name.to_string())),
	})
}

///Compute the admissible output directions for a flit at `current_id` going to
///`destination_id`. `in_direction` is the port the packet entered through,
///consumed by the table lookup; `source_id` is consumed by odd-even.
///
///Panics when an algorithm yields an empty set; that is a bug in the algorithm
///or in the table, never a runtime condition to recover from.
pub fn admissible_outputs(algorithm:RoutingAlgorithm, in_direction:Direction, current_id:usize, source_id:usize, destination_id:usize, width:usize, table:Option<&NodeRoutingTable>) -> Vec<Direction>
{
	if destination_id == current_id
	{
		return vec![Direction::Local];
	}
	let current = Coordinate::from_id(current_id,width);
	let source = Coordinate::from_id(source_id,width);
	let destination = Coordinate::from_id(destination_id,width);
	let outputs = match algorithm
	{
		RoutingAlgorithm::Xy => routing_xy(current,destination),
		RoutingAlgorithm::WestFirst => routing_west_first(current,destination),
		RoutingAlgorithm::NorthLast => routing_north_last(current,destination),
		RoutingAlgorithm::NegativeFirst => routing_negative_first(current,destination),
		RoutingAlgorithm::OddEven => routing_odd_even(current,source,destination),
		RoutingAlgorithm::FullyAdaptive => routing_fully_adaptive(current,destination),
		RoutingAlgorithm::TableBased =>
		{
			let table = table.expect("table-based routing without a loaded routing table");
			match table.admissible_outputs(in_direction,destination_id)
			{
				Some(outputs) => outputs.to_vec(),
				None => panic!("the routing table has no entry for destination {} entering through {} at node {}",destination_id,in_direction,current_id),
			}
		}
		RoutingAlgorithm::Dyad => unimplemented!("the DyAD routing is not implemented"),
		RoutingAlgorithm::LookAhead => unimplemented!("the look-ahead routing is not implemented"),
		RoutingAlgorithm::Nopcar => unimplemented!("the NoPCAR routing is not implemented"),
	};
	if outputs.is_empty()
	{
		panic!("routing {:?} returned an empty admissible set at {} towards {}",algorithm,current,destination);
	}
	outputs
}

fn routing_xy(current:Coordinate, destination:Coordinate) -> Vec<Direction>
{
	if destination.x > current.x
	{
		vec![Direction::East]
	}
	else if destination.x < current.x
	{
		vec![Direction::West]
	}
	else if destination.y > current.y
	{
		vec![Direction::South]
	}
	else
	{
		vec![Direction::North]
	}
}

fn routing_west_first(current:Coordinate, destination:Coordinate) -> Vec<Direction>
{
	//Westward or same-row traffic degenerates to dimension order, which never
	//turns into west afterwards.
	if destination.x <= current.x || destination.y == current.y
	{
		return routing_xy(current,destination);
	}
	if destination.y < current.y
	{
		vec![Direction::North,Direction::East]
	}
	else
	{
		vec![Direction::South,Direction::East]
	}
}

fn routing_north_last(current:Coordinate, destination:Coordinate) -> Vec<Direction>
{
	//Northward legs are deferred to dimension order, whose vertical segment
	//comes after the horizontal one.
	if destination.x == current.x || destination.y <= current.y
	{
		return routing_xy(current,destination);
	}
	if destination.x < current.x
	{
		vec![Direction::South,Direction::West]
	}
	else
	{
		vec![Direction::South,Direction::East]
	}
}

fn routing_negative_first(current:Coordinate, destination:Coordinate) -> Vec<Direction>
{
	//Destinations in the both-negative or both-non-negative octants are served
	//by dimension order; the mixed octants take the negative-axis step first.
	if (destination.x <= current.x && destination.y <= current.y) ||
		(destination.x >= current.x && destination.y >= current.y)
	{
		return routing_xy(current,destination);
	}
	if destination.x > current.x && destination.y < current.y
	{
		vec![Direction::North,Direction::East]
	}
	else
	{
		vec![Direction::South,Direction::West]
	}
}

fn routing_odd_even(current:Coordinate, source:Coordinate, destination:Coordinate) -> Vec<Direction>
{
	let c0 = current.x as i64;
	let c1 = current.y as i64;
	let s0 = source.x as i64;
	let d0 = destination.x as i64;
	let d1 = destination.y as i64;
	let e0 = d0 - c0;
	//Positive e1 means the destination lies north of us.
	let e1 = c1 - d1;
	let mut outputs = Vec::with_capacity(2);
	if e0 == 0
	{
		if e1 > 0
		{
			outputs.push(Direction::North);
		}
		else
		{
			outputs.push(Direction::South);
		}
	}
	else if e0 > 0
	{
		if e1 == 0
		{
			outputs.push(Direction::East);
		}
		else
		{
			//Vertical moves are allowed on odd columns and on the source column.
			if c0 % 2 == 1 || c0 == s0
			{
				if e1 > 0
				{
					outputs.push(Direction::North);
				}
				else
				{
					outputs.push(Direction::South);
				}
			}
			if d0 % 2 == 1 || e0 != 1
			{
				outputs.push(Direction::East);
			}
		}
	}
	else
	{
		outputs.push(Direction::West);
		if c0 % 2 == 0
		{
			if e1 > 0
			{
				outputs.push(Direction::North);
			}
			else if e1 < 0
			{
				outputs.push(Direction::South);
			}
		}
	}
	assert!(!outputs.is_empty() && outputs.len() <= 2,"odd-even produced {:?} at {} from {} towards {}",outputs,current,source,destination);
	outputs
}

fn routing_fully_adaptive(current:Coordinate, destination:Coordinate) -> Vec<Direction>
{
	if destination.x == current.x || destination.y == current.y
	{
		return routing_xy(current,destination);
	}
	if destination.x > current.x && destination.y < current.y
	{
		vec![Direction::North,Direction::East]
	}
	else if destination.x > current.x && destination.y > current.y
	{
		vec![Direction::South,Direction::East]
	}
	else if destination.x < current.x && destination.y > current.y
	{
		vec![Direction::South,Direction::West]
	}
	else
	{
		vec![Direction::North,Direction::West]
	}
}
