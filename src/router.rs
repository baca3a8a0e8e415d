/*!

The wormhole router.

Five input-buffered ports, a per-output reservation table and a per-input
short-circuit map implement wormhole switching: the head flit of a packet
reserves an output through routing plus selection, its body and tail follow
the short-circuit, and the tail tears the reservation down.

Three processes fire each cycle. They read only signals latched at the
previous clock edge, so the fabric may run them in any order across tiles;
within a tile they run as transmit, receive, monitor, which fixes the only
shared state (the input buffers) deterministically.

*/

use log::trace;
use ::rand::rngs::StdRng;

use crate::buffer::CircularBuffer;
use crate::config::Configuration;
use crate::measures::Statistics;
use crate::network::PortSet;
use crate::routing::{self,NodeRoutingTable,RoutingAlgorithm};
use crate::selection::{self,SelectionStrategy};
use crate::{Direction,FlitType,Time,DIRECTIONS};

///Ownership state of one output port.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum Reservation
{
	Free,
	///Owned by the worm entering through the given input direction.
	Reserved(Direction),
	///The link does not exist (mesh edge). Permanent; never selectable.
	Invalid,
}

///Records which input direction currently owns each output direction.
///At most one input owns any output; the head flit acquires, the tail releases.
#[derive(Clone,Debug)]
pub struct ReservationTable
{
	entries: [Reservation;DIRECTIONS+1],
}

impl ReservationTable
{
	pub fn new() -> ReservationTable
	{
		ReservationTable{
			entries: [Reservation::Free;DIRECTIONS+1],
		}
	}
	///Mark an output as non-existent. Done once at mesh build for boundary tiles.
	pub fn invalidate(&mut self, output:Direction)
	{
		self.entries[output.index()] = Reservation::Invalid;
	}
	///Whether a head flit may acquire this output. Invalid outputs never are.
	pub fn is_free(&self, output:Direction) -> bool
	{
		self.entries[output.index()] == Reservation::Free
	}
	pub fn owner(&self, output:Direction) -> Option<Direction>
	{
		match self.entries[output.index()]
		{
			Reservation::Reserved(input) => Some(input),
			_ => None,
		}
	}
	pub fn reserve(&mut self, output:Direction, input:Direction)
	{
		match self.entries[output.index()]
		{
			Reservation::Free => self.entries[output.index()] = Reservation::Reserved(input),
			other => panic!("reserving output {} for input {} but it is {:?}",output,input,other),
		}
	}
	pub fn release(&mut self, output:Direction, input:Direction)
	{
		match self.entries[output.index()]
		{
			Reservation::Reserved(owner) if owner == input => self.entries[output.index()] = Reservation::Free,
			other => panic!("releasing output {} for input {} but it is {:?}",output,input,other),
		}
	}
	///Forget every ownership, keeping the invalid marks of the mesh edges.
	pub fn reset(&mut self)
	{
		for entry in self.entries.iter_mut()
		{
			if let Reservation::Reserved(_) = *entry
			{
				*entry = Reservation::Free;
			}
		}
	}
	pub fn entry(&self, output:Direction) -> Reservation
	{
		self.entries[output.index()]
	}
}

///Status of one link as advertised to the neighbours.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct NopChannelStatus
{
	pub free_slots: usize,
	pub available: bool,
}

///The neighbours-on-path record a router broadcasts on its four cardinal
///outputs every cycle: its identity plus the occupancies its own neighbours
///last advertised. Consumed by look-ahead selection.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct NopData
{
	pub sender_id: usize,
	pub channel_status: [NopChannelStatus;DIRECTIONS],
}

pub struct Router
{
	///Identifier of the tile, `y*width+x`.
	pub local_id: usize,
	///Mesh width, to recover coordinates from identifiers.
	width: usize,
	buffer_depth: usize,
	routing_algorithm: RoutingAlgorithm,
	selection_strategy: SelectionStrategy,
	///This node's slice of the global table, when the algorithm is table-based.
	routing_table: Option<NodeRoutingTable>,
	buffers: Vec<CircularBuffer>,
	pub reservation_table: ReservationTable,
	///Crossbar short-circuit: the output chosen by the worm occupying each input.
	short_circuit: [Option<Direction>;DIRECTIONS+1],
	current_level_rx: [bool;DIRECTIONS+1],
	current_level_tx: [bool;DIRECTIONS+1],
	///Occupancies last advertised by the neighbouring routers, `None` where
	///nothing has been observed (mesh edges, and the local port).
	buffer_level_neighbor: [Option<usize>;DIRECTIONS+1],
}

impl Router
{
	pub fn new(local_id:usize, configuration:&Configuration, routing_table:Option<NodeRoutingTable>) -> Router
	{
		Router{
			local_id,
			width: configuration.mesh_dim_x,
			buffer_depth: configuration.buffer_depth,
			routing_algorithm: configuration.routing_algorithm,
			selection_strategy: configuration.selection_strategy,
			routing_table,
			buffers: (0..DIRECTIONS+1).map(|_|CircularBuffer::new(configuration.buffer_depth)).collect(),
			reservation_table: ReservationTable::new(),
			short_circuit: [None;DIRECTIONS+1],
			current_level_rx: [false;DIRECTIONS+1],
			current_level_tx: [false;DIRECTIONS+1],
			buffer_level_neighbor: [None;DIRECTIONS+1],
		}
	}

	///Accept at most one flit per input: a request toggle with buffer space
	///pushes the flit and toggles our level; the acknowledge always republishes
	///the level. Also samples the neighbour occupancy advertisements.
	pub fn rx_process(&mut self, reset:bool, ports:&PortSet)
	{
		if reset
		{
			for direction in Direction::ALL
			{
				let i = direction.index();
				ports.rx[i].borrow_mut().ack.write(false);
				self.current_level_rx[i] = false;
				//A mid-run reset drops whatever was traversing the router.
				self.buffers[i].clear();
				self.short_circuit[i] = None;
			}
			self.reservation_table.reset();
			self.buffer_level_neighbor = [None;DIRECTIONS+1];
			return;
		}
		for direction in Direction::ALL
		{
			let i = direction.index();
			let mut channel = ports.rx[i].borrow_mut();
			if channel.req.get() != self.current_level_rx[i] && !self.buffers[i].is_full()
			{
				let mut flit = channel.flit.get().expect("request toggled with no flit on the wire");
				if direction != Direction::Local
				{
					flit.hop_count += 1;
				}
				trace!("router {} received {} from {}",self.local_id,flit,direction);
				self.buffers[i].push(flit);
				self.current_level_rx[i] = !self.current_level_rx[i];
			}
			channel.ack.write(self.current_level_rx[i]);
			if i < DIRECTIONS
			{
				self.buffer_level_neighbor[i] = channel.level.get();
			}
		}
	}

	///Serve each input in index order: heads route, select and reserve; bodies
	///and tails follow their short-circuit; a flit moves only when its worm owns
	///the output and the downstream acknowledge matches our level.
	pub fn tx_process(&mut self, reset:bool, cycle:Time, ports:&PortSet, rng:&mut StdRng, statistics:&mut Statistics)
	{
		if reset
		{
			for direction in Direction::ALL
			{
				let i = direction.index();
				ports.tx[i].borrow_mut().req.write(false);
				self.current_level_tx[i] = false;
			}
			return;
		}
		//Input 0 has priority over input 1 and so on. Unfair, and exactly as
		//reproducible as the scenarios require.
		for input in Direction::ALL
		{
			let i = input.index();
			let flit = match self.buffers[i].front()
			{
				None => continue,
				Some(&flit) => flit,
			};
			let output = match flit.flit_type
			{
				FlitType::Head => match self.short_circuit[i]
				{
					//A head may stay blocked for cycles after reserving; it
					//sticks to its choice rather than re-route the worm.
					Some(output) => output,
					None =>
					{
						let candidates = routing::admissible_outputs(
							self.routing_algorithm,
							input,
							self.local_id,
							flit.src_id,
							flit.dst_id,
							self.width,
							self.routing_table.as_ref(),
						);
						let output = selection::select(self.selection_strategy,&candidates,self.buffer_depth,&self.buffer_level_neighbor,rng);
						if !self.reservation_table.is_free(output)
						{
							//Owned by another worm, or an invalid edge; retry next cycle.
							continue;
						}
						self.reservation_table.reserve(output,input);
						self.short_circuit[i] = Some(output);
						output
					}
				},
				_ => self.short_circuit[i].expect("body or tail flit with no short-circuit set"),
			};
			if self.reservation_table.owner(output) != Some(input)
			{
				continue;
			}
			let o = output.index();
			let mut channel = ports.tx[o].borrow_mut();
			if self.current_level_tx[o] == channel.ack.get()
			{
				trace!("router {} sending {} towards {}",self.local_id,flit,output);
				channel.flit.write(Some(flit));
				self.current_level_tx[o] = !self.current_level_tx[o];
				channel.req.write(self.current_level_tx[o]);
				self.buffers[i].pop();
				if flit.flit_type == FlitType::Tail
				{
					self.reservation_table.release(output,input);
					self.short_circuit[i] = None;
				}
				if output == Direction::Local
				{
					statistics.track_received_flit(cycle,&flit);
				}
			}
		}
	}

	///Publish the occupancy of every input buffer on the matching output link
	///and broadcast the neighbours-on-path record on the cardinal ones.
	pub fn buffer_monitor(&mut self, reset:bool, ports:&PortSet)
	{
		if reset
		{
			for direction in Direction::ALL
			{
				ports.tx[direction.index()].borrow_mut().level.write(Some(0));
			}
			return;
		}
		for direction in Direction::ALL
		{
			let i = direction.index();
			ports.tx[i].borrow_mut().level.write(Some(self.buffers[i].len()));
		}
		let nop = self.current_nop_data();
		for direction in Direction::CARDINALS
		{
			ports.tx[direction.index()].borrow_mut().nop.write(Some(nop));
		}
	}

	fn current_nop_data(&self) -> NopData
	{
		let mut channel_status = [NopChannelStatus{ free_slots:0, available:false };DIRECTIONS];
		for j in 0..DIRECTIONS
		{
			if let Some(level) = self.buffer_level_neighbor[j]
			{
				channel_status[j] = NopChannelStatus{
					free_slots: self.buffer_depth.saturating_sub(level),
					available: true,
				};
			}
		}
		NopData{
			sender_id: self.local_id,
			channel_status,
		}
	}

	///Flits currently stored across the five input buffers.
	pub fn occupancy(&self) -> usize
	{
		self.buffers.iter().map(|buffer|buffer.len()).sum()
	}
}
