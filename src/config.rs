/*!

The simulation knobs.

A `Configuration` is built once, validated, and passed immutably into the
mesh builder; components capture only the fields they need. There are no
process-wide globals. The file format is deliberately small: one `key = value`
assignment per line, `#` starts a comment, and the same assignments can be
given as free command line arguments to override the file.

*/

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::Error;
use crate::routing::{new_routing_algorithm,RoutingAlgorithm};
use crate::selection::{new_selection_strategy,SelectionStrategy};
use crate::traffic::{new_traffic_pattern,TrafficPattern};
use crate::Time;

///Everything the simulator core consumes.
#[derive(Clone,Debug)]
pub struct Configuration
{
	///Number of tile columns.
	pub mesh_dim_x: usize,
	///Number of tile rows.
	pub mesh_dim_y: usize,
	///Capacity in flits of each router input buffer.
	pub buffer_depth: usize,
	pub routing_algorithm: RoutingAlgorithm,
	pub selection_strategy: SelectionStrategy,
	pub traffic_distribution: TrafficPattern,
	///Probability of a processing element creating a packet on a given cycle.
	pub packet_injection_rate: f64,
	///Packet sizes are drawn uniformly from `min_packet_size..=max_packet_size`.
	pub min_packet_size: usize,
	pub max_packet_size: usize,
	///Cycles with the reset signal asserted before traffic starts.
	pub reset_time: Time,
	///Simulated cycles after the reset phase.
	pub simulation_time: Time,
	///First cycle included in the statistics.
	pub stats_warm_up_time: Time,
	pub routing_table_filename: Option<String>,
	pub traffic_table_filename: Option<String>,
	pub random_seed: u64,
	///Force trace-level logging of the per-flit events.
	pub verbose_mode: bool,
}

impl Default for Configuration
{
	fn default() -> Configuration
	{
		Configuration{
			mesh_dim_x: 4,
			mesh_dim_y: 4,
			buffer_depth: 4,
			routing_algorithm: RoutingAlgorithm::Xy,
			selection_strategy: SelectionStrategy::Random,
			traffic_distribution: TrafficPattern::Random,
			packet_injection_rate: 0.01,
			min_packet_size: 2,
			max_packet_size: 8,
			reset_time: 1000,
			simulation_time: 10000,
			stats_warm_up_time: 1000,
			routing_table_filename: None,
			traffic_table_filename: None,
			random_seed: 0,
			verbose_mode: false,
		}
	}
}

impl Configuration
{
	///The defaults overridden by the assignments in `path`.
	pub fn from_file(path:&Path) -> Result<Configuration,Error>
	{
		let content = fs::read_to_string(path).map_err(|source|Error::FileAccess{ path:path.to_path_buf(), source })?;
		let mut configuration = Configuration::default();
		for (index,raw) in content.lines().enumerate()
		{
			let line = raw.split('#').next().unwrap().trim();
			if line.is_empty()
			{
				continue;
			}
			let (key,value) = split_assignment(line).ok_or_else(||Error::BadConfiguration(
				format!("{}:{}: expected `key = value`, found `{}`",path.display(),index+1,line)
			))?;
			configuration.apply(key,value)?;
		}
		Ok(configuration)
	}
	///Set one knob from its textual form. Also serves the command line
	///`key=value` overrides.
	pub fn apply(&mut self, key:&str, value:&str) -> Result<(),Error>
	{
		match key
		{
			"mesh_dim_x" => self.mesh_dim_x = parse(key,value)?,
			"mesh_dim_y" => self.mesh_dim_y = parse(key,value)?,
			"buffer_depth" => self.buffer_depth = parse(key,value)?,
			"routing_algorithm" => self.routing_algorithm = new_routing_algorithm(value)?,
			"selection_strategy" => self.selection_strategy = new_selection_strategy(value)?,
			"traffic_distribution" => self.traffic_distribution = new_traffic_pattern(value)?,
			"packet_injection_rate" => self.packet_injection_rate = parse(key,value)?,
			"min_packet_size" => self.min_packet_size = parse(key,value)?,
			"max_packet_size" => self.max_packet_size = parse(key,value)?,
			"reset_time" => self.reset_time = parse(key,value)?,
			"simulation_time" => self.simulation_time = parse(key,value)?,
			"stats_warm_up_time" => self.stats_warm_up_time = parse(key,value)?,
			"routing_table_filename" => self.routing_table_filename = Some(value.to_string()),
			"traffic_table_filename" => self.traffic_table_filename = Some(value.to_string()),
			"random_seed" => self.random_seed = parse(key,value)?,
			"verbose_mode" => self.verbose_mode = parse(key,value)?,
			_ => return Err(Error::UnknownKey(key.to_string())),
		}
		Ok(())
	}
	///Reject contradictory or out-of-range knobs before any building starts.
	pub fn validate(&self) -> Result<(),Error>
	{
		if self.mesh_dim_x < 1 || self.mesh_dim_y < 1
		{
			return Err(Error::BadConfiguration(format!("mesh dimensions {}x{} are not positive",self.mesh_dim_x,self.mesh_dim_y)));
		}
		if self.buffer_depth < 1
		{
			return Err(Error::BadConfiguration("buffer_depth must be at least 1".to_string()));
		}
		if self.min_packet_size < 2
		{
			return Err(Error::BadConfiguration("min_packet_size must be at least 2, a head and a tail".to_string()));
		}
		if self.min_packet_size > self.max_packet_size
		{
			return Err(Error::BadConfiguration(format!("min_packet_size {} exceeds max_packet_size {}",self.min_packet_size,self.max_packet_size)));
		}
		if !(0.0..=1.0).contains(&self.packet_injection_rate)
		{
			return Err(Error::BadConfiguration(format!("packet_injection_rate {} outside [0,1]",self.packet_injection_rate)));
		}
		if self.routing_algorithm == RoutingAlgorithm::TableBased && self.routing_table_filename.is_none()
		{
			return Err(Error::BadConfiguration("RTABLE_BASED routing requires routing_table_filename".to_string()));
		}
		if self.traffic_distribution == TrafficPattern::TableBased && self.traffic_table_filename.is_none()
		{
			return Err(Error::BadConfiguration("TABLE_BASED traffic requires traffic_table_filename".to_string()));
		}
		Ok(())
	}
}

fn split_assignment(line:&str) -> Option<(&str,&str)>
{
	let position = line.find('=')?;
	Some((line[..position].trim(),line[position+1..].trim()))
}

fn parse<T:FromStr>(key:&str, value:&str) -> Result<T,Error>
{
	value.parse().map_err(|_|Error::BadConfiguration(format!("`{}` is not a valid value for {}",value,key)))
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn apply_sets_knobs()
	{
		let mut configuration = Configuration::default();
		configuration.apply("mesh_dim_x","8").unwrap();
		configuration.apply("routing_algorithm","ODD_EVEN").unwrap();
		configuration.apply("selection_strategy","BUFFER_LEVEL").unwrap();
		configuration.apply("verbose_mode","true").unwrap();
		assert_eq!(configuration.mesh_dim_x,8);
		assert_eq!(configuration.routing_algorithm,RoutingAlgorithm::OddEven);
		assert_eq!(configuration.selection_strategy,SelectionStrategy::BufferLevel);
		assert!(configuration.verbose_mode);
		assert!(configuration.apply("not_a_knob","1").is_err());
		assert!(configuration.apply("mesh_dim_x","many").is_err());
	}

	#[test]
	fn validate_rejects_contradictions()
	{
		let mut configuration = Configuration::default();
		configuration.mesh_dim_x = 0;
		assert!(configuration.validate().is_err());
		let mut configuration = Configuration::default();
		configuration.min_packet_size = 9;
		assert!(configuration.validate().is_err());
		let mut configuration = Configuration::default();
		configuration.routing_algorithm = RoutingAlgorithm::TableBased;
		assert!(configuration.validate().is_err());
		configuration.routing_table_filename = Some("mesh.rtable".to_string());
		assert!(configuration.validate().is_ok());
	}
}
