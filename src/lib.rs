/*!
noxim
=====

A cycle-accurate simulator for two-dimensional mesh networks-on-chip.

The model is a synchronous fabric of `width × height` tiles, each one a
wormhole router plus a processing element that injects synthetic traffic.
Tiles talk through point-to-point links under an alternating-bit
request/acknowledge handshake; a single driver advances the whole mesh in
unit cycles. The simulator reports per-flit latency, throughput and
buffer-occupancy statistics as a function of traffic pattern, routing
algorithm and selection strategy.

# Usage

This crate is `noxim`. To use it add `noxim` to your dependencies in your
project's `Cargo.toml`.

```toml
[dependencies]
noxim = "0.1"
```

The accompanying binary runs a whole simulation from a knob file:

```text
noxim -c main.cfg simulation_time=50000 routing_algorithm=ODD_EVEN
```

Free arguments of the form `key=value` override the file, which contains the
same assignments one per line:

```text
# an 8x8 mesh under transpose traffic
mesh_dim_x = 8
mesh_dim_y = 8
buffer_depth = 4
routing_algorithm = ODD_EVEN    # XY, WEST_FIRST, NORTH_LAST, NEGATIVE_FIRST,
                                # ODD_EVEN, FULLY_ADAPTIVE, RTABLE_BASED
selection_strategy = BUFFER_LEVEL
traffic_distribution = TRANSPOSE1
packet_injection_rate = 0.02
random_seed = 42
```

Runs are reproducible: all randomness comes from one generator seeded by
`random_seed`, so equal seed and knobs give equal results.

# Public interface

[`Simulation::new`] validates a [`Configuration`](config::Configuration),
loads the routing and traffic tables when the knobs ask for them, and builds
the mesh; [`Simulation::run`] drives the configured cycle budget and
[`Simulation::write_result`] emits the report. [`file_main`] wraps the three
for the binary. The pieces are public — [`network::Network`],
[`router::Router`], [`routing`], [`selection`] — so tests and tools can build
a fabric directly and inspect it mid-flight.

*/

pub mod error;
pub mod config;
pub mod signal;
pub mod buffer;
pub mod matrix;
pub mod routing;
pub mod selection;
pub mod router;
pub mod traffic;
pub mod network;
pub mod measures;

use std::fmt;
use std::fs::File;
use std::io::{self,Write};
use std::path::Path;
use std::rc::Rc;

use indicatif::{ProgressBar,ProgressStyle};
use rand::{rngs::StdRng,SeedableRng};

use crate::config::Configuration;
use crate::error::Error;
use crate::measures::Statistics;
use crate::network::Network;
use crate::routing::{GlobalRoutingTable,RoutingAlgorithm};
use crate::traffic::{GlobalTrafficTable,TrafficPattern};

///An amount of cycles.
pub type Time = u64;

///The number of cardinal link directions of a tile. With the local port,
///per-port arrays have `DIRECTIONS+1` entries.
pub const DIRECTIONS: usize = 4;

///A link direction of a tile. The first four couple neighbouring routers;
///`Local` couples a router to its own processing element. The declaration
///order is the port index order, which is also the fixed service order of the
///transmit process.
#[derive(Clone,Copy,Debug,PartialEq,Eq,Hash)]
pub enum Direction
{
	North,
	East,
	South,
	West,
	Local,
}

impl Direction
{
	pub const ALL: [Direction;DIRECTIONS+1] = [Direction::North,Direction::East,Direction::South,Direction::West,Direction::Local];
	pub const CARDINALS: [Direction;DIRECTIONS] = [Direction::North,Direction::East,Direction::South,Direction::West];
	///Position of this direction in the per-port arrays.
	pub fn index(self) -> usize
	{
		match self
		{
			Direction::North => 0,
			Direction::East => 1,
			Direction::South => 2,
			Direction::West => 3,
			Direction::Local => 4,
		}
	}
	pub fn from_index(index:usize) -> Direction
	{
		match index
		{
			0 => Direction::North,
			1 => Direction::East,
			2 => Direction::South,
			3 => Direction::West,
			4 => Direction::Local,
			_ => panic!("{} is not a direction index",index),
		}
	}
}

impl fmt::Display for Direction
{
	fn fmt(&self, formatter:&mut fmt::Formatter) -> fmt::Result
	{
		let name = match self
		{
			Direction::North => "north",
			Direction::East => "east",
			Direction::South => "south",
			Direction::West => "west",
			Direction::Local => "local",
		};
		write!(formatter,"{}",name)
	}
}

///A tile position in the mesh. `y` grows southward.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct Coordinate
{
	pub x: usize,
	pub y: usize,
}

impl Coordinate
{
	///The identifier of this position in a mesh `width` tiles wide: `y*width+x`.
	pub fn to_id(self, width:usize) -> usize
	{
		self.y*width + self.x
	}
	pub fn from_id(id:usize, width:usize) -> Coordinate
	{
		Coordinate{
			x: id%width,
			y: id/width,
		}
	}
}

impl fmt::Display for Coordinate
{
	fn fmt(&self, formatter:&mut fmt::Formatter) -> fmt::Result
	{
		write!(formatter,"({},{})",self.x,self.y)
	}
}

///The three roles a flit plays inside a packet. A packet is the contiguous
///sequence head, bodies, tail on one logical input; the head carves the path
///through the mesh and the tail closes it.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub enum FlitType
{
	Head,
	Body,
	Tail,
}

///The flow-control unit: what one link transfers in one cycle.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct Flit
{
	pub src_id: usize,
	pub dst_id: usize,
	pub flit_type: FlitType,
	///Position inside the packet, starting at the head with 0.
	pub sequence_number: usize,
	///Cycle in which the packet was created.
	pub timestamp: Time,
	///Router-to-router links traversed so far.
	pub hop_count: usize,
}

impl fmt::Display for Flit
{
	fn fmt(&self, formatter:&mut fmt::Formatter) -> fmt::Result
	{
		let role = match self.flit_type
		{
			FlitType::Head => "head",
			FlitType::Body => "body",
			FlitType::Tail => "tail",
		};
		write!(formatter,"flit {}->{} #{} ({})",self.src_id,self.dst_id,self.sequence_number,role)
	}
}

///A built mesh together with its clock driver, random generator and
///statistics sink.
pub struct Simulation
{
	pub configuration: Configuration,
	pub network: Network,
	pub statistics: Statistics,
	rng: StdRng,
	cycle: Time,
}

impl Simulation
{
	///Validates the knobs, loads the routing and traffic tables when the
	///algorithms require them and builds the mesh. Any failure here aborts
	///before the first cycle.
	pub fn new(configuration:Configuration) -> Result<Simulation,Error>
	{
		configuration.validate()?;
		let routing_table = if configuration.routing_algorithm == RoutingAlgorithm::TableBased
		{
			let filename = configuration.routing_table_filename.as_ref().expect("validated just above");
			Some(GlobalRoutingTable::load(Path::new(filename))?)
		}
		else
		{
			None
		};
		let traffic_table = if configuration.traffic_distribution == TrafficPattern::TableBased
		{
			let filename = configuration.traffic_table_filename.as_ref().expect("validated just above");
			Some(Rc::new(GlobalTrafficTable::load(Path::new(filename))?))
		}
		else
		{
			None
		};
		let statistics = Statistics::new(configuration.stats_warm_up_time,configuration.mesh_dim_x*configuration.mesh_dim_y);
		let network = Network::new(&configuration,routing_table.as_ref(),traffic_table.as_ref());
		let rng = StdRng::seed_from_u64(configuration.random_seed);
		Ok(Simulation{
			configuration,
			network,
			statistics,
			rng,
			cycle: 0,
		})
	}
	///Advance one cycle. The reset signal is asserted during the initial
	///`reset_time` cycles.
	pub fn step(&mut self)
	{
		let reset = self.cycle < self.configuration.reset_time;
		self.network.step(self.cycle,reset,&mut self.rng,&mut self.statistics);
		self.cycle += 1;
	}
	///Drive the whole configured cycle budget.
	pub fn run(&mut self)
	{
		let total_cycles = self.configuration.reset_time + self.configuration.simulation_time;
		let progress = if self.configuration.verbose_mode
		{
			//The bar would fight the per-flit logging for the terminal.
			ProgressBar::hidden()
		}
		else
		{
			ProgressBar::new(total_cycles)
		};
		progress.set_style(ProgressStyle::default_bar().template("{elapsed_precise} {bar:40} {pos}/{len} cycles"));
		while self.cycle < total_cycles
		{
			self.step();
			progress.inc(1);
		}
		progress.finish_and_clear();
	}
	pub fn current_cycle(&self) -> Time
	{
		self.cycle
	}
	///The report: a timestamped header, the shape of the experiment and the
	///aggregated measures.
	pub fn write_result<W:Write>(&self, out:&mut W) -> io::Result<()>
	{
		writeln!(out,"# noxim results, {}",chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))?;
		writeln!(out,"mesh: {}x{}",self.configuration.mesh_dim_x,self.configuration.mesh_dim_y)?;
		writeln!(out,"buffer_depth: {}",self.configuration.buffer_depth)?;
		writeln!(out,"routing_algorithm: {:?}",self.configuration.routing_algorithm)?;
		writeln!(out,"selection_strategy: {:?}",self.configuration.selection_strategy)?;
		writeln!(out,"traffic_distribution: {:?}",self.configuration.traffic_distribution)?;
		writeln!(out,"packet_injection_rate: {}",self.configuration.packet_injection_rate)?;
		writeln!(out,"random_seed: {}",self.configuration.random_seed)?;
		self.statistics.write_report(out,self.cycle)
	}
}

fn usage(options:&getopts::Options)
{
	let brief = "Usage: noxim [options] [key=value]...";
	print!("{}",options.usage(brief));
}

///The entry point used by the `noxim` binary: parse options, build the
///configuration from the optional file plus the `key=value` overrides, run,
///and write the report to stdout or to the requested file.
pub fn file_main(args:&[String]) -> Result<(),Error>
{
	let mut options = getopts::Options::new();
	options.optflag("h","help","show this usage message");
	options.optopt("c","configuration","file with `key = value` knob assignments","FILE");
	options.optopt("r","results","write the final report into FILE instead of stdout","FILE");
	let matches = options.parse(&args[1..]).map_err(|error|Error::BadConfiguration(error.to_string()))?;
	if matches.opt_present("h")
	{
		usage(&options);
		return Ok(());
	}
	let mut configuration = match matches.opt_str("c")
	{
		Some(filename) => Configuration::from_file(Path::new(&filename))?,
		None => Configuration::default(),
	};
	for free in matches.free.iter()
	{
		match free.split_once('=')
		{
			Some((key,value)) => configuration.apply(key.trim(),value.trim())?,
			None => return Err(Error::BadConfiguration(format!("free argument `{}` is not a `key=value` override",free))),
		}
	}
	configuration.validate()?;
	let mut builder = env_logger::Builder::from_default_env();
	if configuration.verbose_mode
	{
		builder.filter_level(log::LevelFilter::Trace);
	}
	let _ = builder.try_init();
	let mut simulation = Simulation::new(configuration)?;
	simulation.run();
	match matches.opt_str("r")
	{
		Some(filename) =>
		{
			let mut file = File::create(Path::new(&filename)).map_err(|source|Error::FileAccess{ path:filename.clone().into(), source })?;
			simulation.write_result(&mut file).map_err(|source|Error::FileAccess{ path:filename.into(), source })?;
		}
		None =>
		{
			let stdout = io::stdout();
			simulation.write_result(&mut stdout.lock()).expect("could not write the report to stdout");
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests
{
	use super::*;
	use itertools::iproduct;

	#[test]
	fn coordinate_identifier_round_trip()
	{
		let width = 5;
		let height = 3;
		for (x,y) in iproduct!(0..width,0..height)
		{
			let coordinate = Coordinate{x,y};
			assert_eq!(Coordinate::from_id(coordinate.to_id(width),width),coordinate);
		}
		for id in 0..width*height
		{
			assert_eq!(Coordinate::from_id(id,width).to_id(width),id);
		}
	}

	#[test]
	fn direction_indices_cover_the_ports()
	{
		for (index,direction) in Direction::ALL.iter().enumerate()
		{
			assert_eq!(direction.index(),index);
			assert_eq!(Direction::from_index(index),*direction);
		}
		assert_eq!(Direction::ALL.len(),DIRECTIONS+1);
	}

	#[test]
	fn identifiers_grow_southward()
	{
		//Node 0 is the north-west corner; its southern neighbour is one row later.
		assert_eq!(Coordinate{x:0,y:0}.to_id(4),0);
		assert_eq!(Coordinate{x:0,y:1}.to_id(4),4);
		assert_eq!(Coordinate{x:3,y:3}.to_id(4),15);
	}
}
