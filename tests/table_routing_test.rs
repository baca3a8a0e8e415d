mod common;

use std::fs;

use common::*;
use noxim::routing::RoutingAlgorithm;
use noxim::Simulation;

///A table forcing the non-minimal walk (0,0) -> (0,1) -> (1,1) -> (1,0) -> (2,0),
///keyed by the port each hop enters through.
const FORCED_PATH_TABLE: &str = "
# node in_dir dst outs
0 4 2 2
4 0 2 1
5 3 2 0
1 2 2 1
2 3 2 4
";

#[test]
fn table_routing_follows_the_forced_path()
{
	let path = std::env::temp_dir().join("noxim_forced_path.rtable");
	fs::write(&path,FORCED_PATH_TABLE).unwrap();

	let mut configuration = quiet_configuration();
	configuration.routing_algorithm = RoutingAlgorithm::TableBased;
	configuration.routing_table_filename = Some(path.to_string_lossy().into_owned());
	let mut simulation = Simulation::new(configuration).unwrap();
	simulation.network.search_node_mut(0).unwrap().pe.inject_packet(2,3,0);
	for _ in 0..300
	{
		simulation.step();
	}

	assert_eq!(simulation.statistics.received_packets,1);
	let arrival = simulation.statistics.packet_log[0];
	assert_eq!(arrival.source,0);
	assert_eq!(arrival.destination,2);
	//Four links where dimension order would take two: the detour was honoured
	//at every router, and the packet still arrived whole.
	assert_eq!(arrival.hops,4);
	assert_eq!(simulation.statistics.received_flits,3);
	assert_eq!(simulation.network.search_node(2).unwrap().pe.delivered_packets,1);
}

#[test]
fn missing_routing_table_aborts_startup()
{
	let mut configuration = quiet_configuration();
	configuration.routing_algorithm = RoutingAlgorithm::TableBased;
	//No filename at all: rejected by validation.
	assert!(Simulation::new(configuration.clone()).is_err());
	//A filename that does not exist: rejected by the loader.
	configuration.routing_table_filename = Some("/nonexistent/mesh.rtable".to_string());
	assert!(Simulation::new(configuration).is_err());
}

#[test]
fn malformed_routing_table_aborts_startup()
{
	let path = std::env::temp_dir().join("noxim_malformed.rtable");
	fs::write(&path,"0 4 2 9\n").unwrap();
	let mut configuration = quiet_configuration();
	configuration.routing_algorithm = RoutingAlgorithm::TableBased;
	configuration.routing_table_filename = Some(path.to_string_lossy().into_owned());
	assert!(Simulation::new(configuration).is_err());
}
