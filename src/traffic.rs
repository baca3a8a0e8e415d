/*!

The processing element attached to each tile and its synthetic traffic.

The element is a collaborator of the router core: only the link protocol on
the local port is contractual. It injects whole packets as flit sequences,
sinks whatever the router delivers, and checks that delivered worms arrive
whole and in order.

*/

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use log::trace;
use ::rand::{Rng,rngs::StdRng};

use crate::config::Configuration;
use crate::error::Error;
use crate::measures::Statistics;
use crate::network::PeLink;
use crate::{Coordinate,Flit,FlitType,Time};

///The closed set of synthetic destination patterns.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum TrafficPattern
{
	///Uniformly random destination, excluding the sender.
	Random,
	///`(x,y)` sends to `(dim_y-1-y, dim_x-1-x)`. Meant for square meshes.
	Transpose1,
	///`(x,y)` sends to `(y,x)`.
	Transpose2,
	///Destinations and rates taken from the loaded traffic table.
	TableBased,
}

///Build a traffic pattern from its configuration name.
pub fn new_traffic_pattern(name:&str) -> Result<TrafficPattern,Error>
{
	Ok(match name.to_ascii_uppercase().as_str()
	{
		"RANDOM" => TrafficPattern::Random,
		"TRANSPOSE1" => TrafficPattern::Transpose1,
		"TRANSPOSE2" => TrafficPattern::Transpose2,
		"TABLE_BASED" => TrafficPattern::TableBased,
		_ => return Err(Error::UnknownTrafficPattern(name.to_string())),
	})
}

///One line of the traffic table: a source, a destination and the per-cycle
///probability of the source creating a packet for it.
#[derive(Clone,Copy,Debug)]
pub struct Communication
{
	pub source: usize,
	pub destination: usize,
	pub load: f64,
}

///The table behind `TABLE_BASED` traffic. Text file of `src dst load` lines,
///`#` starts a comment.
#[derive(Clone,Debug,Default)]
pub struct GlobalTrafficTable
{
	entries: Vec<Communication>,
}

impl GlobalTrafficTable
{
	pub fn load(path:&Path) -> Result<GlobalTrafficTable,Error>
	{
		let content = fs::read_to_string(path).map_err(|source|Error::FileAccess{ path:path.to_path_buf(), source })?;
		GlobalTrafficTable::parse(path,&content)
	}
	fn parse(path:&Path, content:&str) -> Result<GlobalTrafficTable,Error>
	{
		let mut entries = Vec::new();
		for (index,raw) in content.lines().enumerate()
		{
			let line = raw.split('#').next().unwrap().trim();
			if line.is_empty()
			{
				continue;
			}
			let malformed = |reason:String| Error::MalformedTable{
				table: "traffic",
				path: path.to_path_buf(),
				line: index+1,
				reason,
			};
			let fields: Vec<&str> = line.split_whitespace().collect();
			if fields.len() != 3
			{
				return Err(malformed(format!("expected 3 fields, found {}",fields.len())));
			}
			let source = fields[0].parse().map_err(|_|malformed(format!("`{}` is not a node index",fields[0])))?;
			let destination = fields[1].parse().map_err(|_|malformed(format!("`{}` is not a node index",fields[1])))?;
			let load: f64 = fields[2].parse().map_err(|_|malformed(format!("`{}` is not a load",fields[2])))?;
			if !(0.0..=1.0).contains(&load)
			{
				return Err(malformed(format!("load {} outside [0,1]",load)));
			}
			entries.push(Communication{ source, destination, load });
		}
		Ok(GlobalTrafficTable{ entries })
	}
	///How many rows name `id` as their source. An element with none never transmits.
	pub fn occurrences_as_source(&self, id:usize) -> usize
	{
		self.entries.iter().filter(|communication|communication.source==id).count()
	}
	pub fn communications_from(&self, id:usize) -> impl Iterator<Item=&Communication>
	{
		self.entries.iter().filter(move |communication|communication.source==id)
	}
}

///The traffic endpoint of one tile.
pub struct ProcessingElement
{
	pub local_id: usize,
	///True iff the traffic table records zero source occurrences for this element.
	pub never_transmit: bool,
	pattern: TrafficPattern,
	traffic_table: Option<Rc<GlobalTrafficTable>>,
	packet_injection_rate: f64,
	min_packet_size: usize,
	max_packet_size: usize,
	mesh_dim_x: usize,
	mesh_dim_y: usize,
	current_level_tx: bool,
	current_level_rx: bool,
	///Flits generated but not yet pushed into the router.
	pending: VecDeque<Flit>,
	///Source and flits-seen of the packet currently being delivered, to check
	///the worm arrives whole and ordered.
	arriving: Option<(usize,usize)>,
	///Packets fully delivered to this element.
	pub delivered_packets: usize,
}

impl ProcessingElement
{
	pub fn new(local_id:usize, configuration:&Configuration, traffic_table:Option<Rc<GlobalTrafficTable>>) -> ProcessingElement
	{
		let never_transmit = match (configuration.traffic_distribution,&traffic_table)
		{
			(TrafficPattern::TableBased,&Some(ref table)) => table.occurrences_as_source(local_id)==0,
			_ => false,
		};
		ProcessingElement{
			local_id,
			never_transmit,
			pattern: configuration.traffic_distribution,
			traffic_table,
			packet_injection_rate: configuration.packet_injection_rate,
			min_packet_size: configuration.min_packet_size,
			max_packet_size: configuration.max_packet_size,
			mesh_dim_x: configuration.mesh_dim_x,
			mesh_dim_y: configuration.mesh_dim_y,
			current_level_tx: false,
			current_level_rx: false,
			pending: VecDeque::new(),
			arriving: None,
			delivered_packets: 0,
		}
	}

	///Queue one packet of `size` flits towards `destination`, timestamped `cycle`.
	pub fn inject_packet(&mut self, destination:usize, size:usize, cycle:Time)
	{
		assert!(size>=2,"a packet is at least a head and a tail");
		for sequence_number in 0..size
		{
			let flit_type = if sequence_number==0
			{
				FlitType::Head
			}
			else if sequence_number==size-1
			{
				FlitType::Tail
			}
			else
			{
				FlitType::Body
			};
			self.pending.push_back(Flit{
				src_id: self.local_id,
				dst_id: destination,
				flit_type,
				sequence_number,
				timestamp: cycle,
				hop_count: 0,
			});
		}
	}

	fn generate(&mut self, cycle:Time, rng:&mut StdRng)
	{
		if self.never_transmit
		{
			return;
		}
		match self.pattern
		{
			TrafficPattern::TableBased =>
			{
				let table = self.traffic_table.clone().expect("table-based traffic without a loaded traffic table");
				for communication in table.communications_from(self.local_id)
				{
					if rng.gen::<f64>() < communication.load
					{
						let size = self.random_size(rng);
						self.inject_packet(communication.destination,size,cycle);
					}
				}
			}
			_ =>
			{
				if rng.gen::<f64>() < self.packet_injection_rate
				{
					if let Some(destination) = self.destination(rng)
					{
						let size = self.random_size(rng);
						self.inject_packet(destination,size,cycle);
					}
				}
			}
		}
	}

	fn random_size(&self, rng:&mut StdRng) -> usize
	{
		if self.min_packet_size == self.max_packet_size
		{
			self.min_packet_size
		}
		else
		{
			rng.gen_range(self.min_packet_size..=self.max_packet_size)
		}
	}

	///The destination under the configured pattern, or `None` when the pattern
	///sends nowhere from this position.
	fn destination(&self, rng:&mut StdRng) -> Option<usize>
	{
		let position = Coordinate::from_id(self.local_id,self.mesh_dim_x);
		let candidate = match self.pattern
		{
			TrafficPattern::Random =>
			{
				let nodes = self.mesh_dim_x*self.mesh_dim_y;
				if nodes < 2
				{
					return None;
				}
				loop
				{
					let candidate = rng.gen_range(0..nodes);
					if candidate != self.local_id
					{
						return Some(candidate);
					}
				}
			}
			TrafficPattern::Transpose1 => Coordinate{
				x: self.mesh_dim_y-1-position.y,
				y: self.mesh_dim_x-1-position.x,
			},
			TrafficPattern::Transpose2 => Coordinate{
				x: position.y,
				y: position.x,
			},
			TrafficPattern::TableBased => unreachable!("table-based generation does not use a pattern destination"),
		};
		if candidate.x >= self.mesh_dim_x || candidate.y >= self.mesh_dim_y
		{
			return None;
		}
		let id = candidate.to_id(self.mesh_dim_x);
		if id == self.local_id
		{
			None
		}
		else
		{
			Some(id)
		}
	}

	///Create this cycle's packets and push at most one pending flit into the
	///router, under the alternating-bit handshake.
	pub fn tx_process(&mut self, reset:bool, link:&PeLink, cycle:Time, rng:&mut StdRng, statistics:&mut Statistics)
	{
		if reset
		{
			link.tx.borrow_mut().req.write(false);
			self.current_level_tx = false;
			self.pending.clear();
			return;
		}
		self.generate(cycle,rng);
		if let Some(&flit) = self.pending.front()
		{
			let mut channel = link.tx.borrow_mut();
			if channel.ack.get() == self.current_level_tx
			{
				trace!("element {} injecting {}",self.local_id,flit);
				channel.flit.write(Some(flit));
				self.current_level_tx = !self.current_level_tx;
				channel.req.write(self.current_level_tx);
				self.pending.pop_front();
				statistics.track_injected_flit(cycle,&flit);
			}
		}
	}

	///Sink whatever the router delivers. The element never back-pressures.
	pub fn rx_process(&mut self, reset:bool, link:&PeLink)
	{
		if reset
		{
			link.rx.borrow_mut().ack.write(false);
			self.current_level_rx = false;
			self.arriving = None;
			return;
		}
		let mut channel = link.rx.borrow_mut();
		if channel.req.get() != self.current_level_rx
		{
			let flit = channel.flit.get().expect("request toggled with no flit on the wire");
			trace!("element {} consuming {}",self.local_id,flit);
			assert_eq!(flit.dst_id,self.local_id,"element {} received a flit for {}",self.local_id,flit.dst_id);
			//The reservation of the router's local output keeps worms whole; check it.
			match (flit.flit_type,self.arriving)
			{
				(FlitType::Head,None) => self.arriving = Some((flit.src_id,1)),
				(FlitType::Body,Some((source,seen))) if source==flit.src_id && seen==flit.sequence_number =>
				{
					self.arriving = Some((source,seen+1));
				}
				(FlitType::Tail,Some((source,seen))) if source==flit.src_id && seen==flit.sequence_number =>
				{
					self.arriving = None;
					self.delivered_packets += 1;
				}
				(flit_type,state) => panic!("element {} received a {:?} flit from {} while in state {:?}",self.local_id,flit_type,flit.src_id,state),
			}
			self.current_level_rx = !self.current_level_rx;
		}
		channel.ack.write(self.current_level_rx);
	}

	///Flits generated and still waiting to enter the router.
	pub fn pending_flits(&self) -> usize
	{
		self.pending.len()
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use std::path::PathBuf;

	fn parse(content:&str) -> Result<GlobalTrafficTable,Error>
	{
		GlobalTrafficTable::parse(&PathBuf::from("test.ttable"),content)
	}

	#[test]
	fn table_counts_source_occurrences()
	{
		let table = parse("
			0 5 0.1
			0 7 0.2  # second flow from node 0
			3 5 1.0
		").unwrap();
		assert_eq!(table.occurrences_as_source(0),2);
		assert_eq!(table.occurrences_as_source(3),1);
		assert_eq!(table.occurrences_as_source(5),0);
		let destinations: Vec<usize> = table.communications_from(0).map(|communication|communication.destination).collect();
		assert_eq!(destinations,vec![5,7]);
	}

	#[test]
	fn table_rejects_out_of_range_loads()
	{
		assert!(parse("0 5 1.5").is_err());
		assert!(parse("0 5 -0.1").is_err());
		assert!(parse("0 5").is_err());
	}

	#[test]
	fn injected_packets_are_well_formed()
	{
		let configuration = Configuration::default();
		let mut element = ProcessingElement::new(0,&configuration,None);
		element.inject_packet(5,4,7);
		assert_eq!(element.pending_flits(),4);
		let flits: Vec<Flit> = element.pending.iter().copied().collect();
		assert_eq!(flits[0].flit_type,FlitType::Head);
		assert_eq!(flits[1].flit_type,FlitType::Body);
		assert_eq!(flits[2].flit_type,FlitType::Body);
		assert_eq!(flits[3].flit_type,FlitType::Tail);
		for (sequence_number,flit) in flits.iter().enumerate()
		{
			assert_eq!(flit.sequence_number,sequence_number);
			assert_eq!(flit.timestamp,7);
			assert_eq!(flit.src_id,0);
			assert_eq!(flit.dst_id,5);
		}
	}

	#[test]
	fn transpose_destinations()
	{
		let mut configuration = Configuration::default();
		configuration.traffic_distribution = TrafficPattern::Transpose2;
		let mut rng = <StdRng as ::rand::SeedableRng>::seed_from_u64(10u64);
		//(1,2) -> (2,1) = id 6 on a 4-wide mesh.
		let element = ProcessingElement::new(Coordinate{x:1,y:2}.to_id(4),&configuration,None);
		assert_eq!(element.destination(&mut rng),Some(Coordinate{x:2,y:1}.to_id(4)));
		//The diagonal maps to itself and stays silent.
		let element = ProcessingElement::new(Coordinate{x:3,y:3}.to_id(4),&configuration,None);
		assert_eq!(element.destination(&mut rng),None);
	}
}
