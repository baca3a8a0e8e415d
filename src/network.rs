/*!

The mesh fabric: tiles, the grids of link channels that couple them, and the
per-cycle drive.

Routers never hold references to their neighbours. Each directed link is a
`Channel` of latched signals shared by its two endpoint tiles through
reference counting, so the cycles of the mesh graph live only in the wiring.

*/

use std::cell::RefCell;
use std::rc::Rc;

use itertools::iproduct;
use log::debug;
use ::rand::rngs::StdRng;

use crate::config::Configuration;
use crate::matrix::Matrix;
use crate::measures::Statistics;
use crate::router::{NopData,Router};
use crate::routing::{GlobalRoutingTable,RoutingAlgorithm};
use crate::signal::Signal;
use crate::traffic::{GlobalTrafficTable,ProcessingElement,TrafficPattern};
use crate::{Coordinate,Direction,Flit,Time,DIRECTIONS};

///The signals of one directed link: request, flit and the advertisements
///travel with the data; the acknowledge travels backwards. The default value
///is also the tie-off of the boundary stubs: requests low, advertisements
///invalid.
#[derive(Default)]
pub struct Channel
{
	///Toggled by the sender when a new flit is on the wire.
	pub req: Signal<bool>,
	pub flit: Signal<Option<Flit>>,
	///Toggled by the receiver when it accepts the flit.
	pub ack: Signal<bool>,
	///Occupancy of the input buffer this link feeds, as last published by its
	///owner. `None` beyond the mesh edge.
	pub level: Signal<Option<usize>>,
	pub nop: Signal<Option<NopData>>,
}

impl Channel
{
	pub fn commit(&mut self)
	{
		self.req.commit();
		self.flit.commit();
		self.ack.commit();
		self.level.commit();
		self.nop.commit();
	}
}

///The five receive and five transmit channel endpoints of a tile, indexed by
///`Direction::index`.
pub struct PortSet
{
	pub rx: Vec<Rc<RefCell<Channel>>>,
	pub tx: Vec<Rc<RefCell<Channel>>>,
}

///The processing-element link endpoints, seen from the element's side.
pub struct PeLink
{
	///Element to router; the router's local receive side.
	pub tx: Rc<RefCell<Channel>>,
	///Router to element; the router's local transmit side.
	pub rx: Rc<RefCell<Channel>>,
}

///A router, its processing element and their link endpoints.
pub struct Tile
{
	pub router: Router,
	pub pe: ProcessingElement,
	pub ports: PortSet,
	pub pe_link: PeLink,
}

///An instantiated mesh.
pub struct Network
{
	pub width: usize,
	pub height: usize,
	pub tiles: Vec<Tile>,
	///Every channel of the fabric, for the end-of-cycle commit.
	channels: Vec<Rc<RefCell<Channel>>>,
}

impl Network
{
	///Builds the `width × height` mesh: creates the channel grids, wires every
	///tile to its four neighbours and its processing element, and invalidates
	///the reservation entries of the missing boundary links. Boundary channels
	///stay at their tie-off defaults.
	pub fn new(configuration:&Configuration, routing_table:Option<&GlobalRoutingTable>, traffic_table:Option<&Rc<GlobalTrafficTable>>) -> Network
	{
		let width = configuration.mesh_dim_x;
		let height = configuration.mesh_dim_y;
		assert!(width>=1 && height>=1,"a mesh needs at least one tile");
		if configuration.routing_algorithm == RoutingAlgorithm::TableBased
		{
			assert!(routing_table.is_some(),"table-based routing configured without a routing table");
		}
		if configuration.traffic_distribution == TrafficPattern::TableBased
		{
			assert!(traffic_table.is_some(),"table-based traffic configured without a traffic table");
		}
		let new_channel = || Rc::new(RefCell::new(Channel::default()));
		//One grid per travel direction, one extra row and column for the
		//boundary stubs. Entry (x,y) of `to_south` is the southward link
		//crossing into tile (x,y) from its north side, and so on.
		let to_north = Matrix::generate(width+1,height+1,|_,_|new_channel());
		let to_east = Matrix::generate(width+1,height+1,|_,_|new_channel());
		let to_south = Matrix::generate(width+1,height+1,|_,_|new_channel());
		let to_west = Matrix::generate(width+1,height+1,|_,_|new_channel());
		let mut channels: Vec<Rc<RefCell<Channel>>> = Vec::new();
		let mut tiles = Vec::with_capacity(width*height);
		for (y,x) in iproduct!(0..height,0..width)
		{
			let id = Coordinate{x,y}.to_id(width);
			let pe_to_router = new_channel();
			let router_to_pe = new_channel();
			channels.push(pe_to_router.clone());
			channels.push(router_to_pe.clone());
			let ports = PortSet{
				rx: vec![
					to_south.get(x,y).clone(),
					to_west.get(x+1,y).clone(),
					to_north.get(x,y+1).clone(),
					to_east.get(x,y).clone(),
					pe_to_router.clone(),
				],
				tx: vec![
					to_north.get(x,y).clone(),
					to_east.get(x+1,y).clone(),
					to_south.get(x,y+1).clone(),
					to_west.get(x,y).clone(),
					router_to_pe.clone(),
				],
			};
			let pe_link = PeLink{
				tx: pe_to_router,
				rx: router_to_pe,
			};
			let node_table = routing_table.map(|table|table.node_routing_table(id));
			let router = Router::new(id,configuration,node_table);
			let pe = ProcessingElement::new(id,configuration,traffic_table.cloned());
			tiles.push(Tile{ router, pe, ports, pe_link });
		}
		//Invalidate reservation entries for the non-existent boundary links.
		for x in 0..width
		{
			tiles[Coordinate{x,y:0}.to_id(width)].router.reservation_table.invalidate(Direction::North);
			tiles[Coordinate{x,y:height-1}.to_id(width)].router.reservation_table.invalidate(Direction::South);
		}
		for y in 0..height
		{
			tiles[Coordinate{x:0,y}.to_id(width)].router.reservation_table.invalidate(Direction::West);
			tiles[Coordinate{x:width-1,y}.to_id(width)].router.reservation_table.invalidate(Direction::East);
		}
		channels.extend(to_north);
		channels.extend(to_east);
		channels.extend(to_south);
		channels.extend(to_west);
		debug!("built a {}x{} mesh with {} channels",width,height,channels.len());
		Network{ width, height, tiles, channels }
	}

	///Advance one cycle: evaluate every tile against the signals latched at
	///the previous edge, then commit every pending signal write at once.
	pub fn step(&mut self, cycle:Time, reset:bool, rng:&mut StdRng, statistics:&mut Statistics)
	{
		for tile in self.tiles.iter_mut()
		{
			let Tile{ ref mut router, ref mut pe, ref ports, ref pe_link } = *tile;
			router.tx_process(reset,cycle,ports,rng,statistics);
			router.rx_process(reset,ports);
			router.buffer_monitor(reset,ports);
			pe.tx_process(reset,pe_link,cycle,rng,statistics);
			pe.rx_process(reset,pe_link);
		}
		if !reset
		{
			let stored: usize = self.tiles.iter().map(|tile|tile.router.occupancy()).sum();
			statistics.track_buffer_occupancy(cycle,stored,self.tiles.len()*(DIRECTIONS+1));
		}
		for channel in self.channels.iter()
		{
			channel.borrow_mut().commit();
		}
	}

	///The tile whose router carries the given identifier.
	pub fn search_node(&self, id:usize) -> Option<&Tile>
	{
		self.tiles.iter().find(|tile|tile.router.local_id==id)
	}
	pub fn search_node_mut(&mut self, id:usize) -> Option<&mut Tile>
	{
		self.tiles.iter_mut().find(|tile|tile.router.local_id==id)
	}
	pub fn tile(&self, position:Coordinate) -> &Tile
	{
		&self.tiles[position.to_id(self.width)]
	}
	pub fn tile_mut(&mut self, position:Coordinate) -> &mut Tile
	{
		let index = position.to_id(self.width);
		&mut self.tiles[index]
	}
	///Flits anywhere in the fabric: stored in router buffers or queued in the
	///elements. Zero means the network has drained.
	pub fn in_flight(&self) -> usize
	{
		self.tiles.iter().map(|tile|tile.router.occupancy()+tile.pe.pending_flits()).sum()
	}
}
