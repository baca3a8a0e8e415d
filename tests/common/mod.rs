//Not every test binary uses every helper.
#![allow(dead_code)]

use noxim::config::Configuration;
use noxim::measures::Statistics;
use noxim::network::Network;
use noxim::Time;
use rand::rngs::StdRng;

///A 4x4 mesh that stays silent on its own: no synthetic traffic, no reset
///phase, statistics from cycle zero. Tests inject what they need by hand.
pub fn quiet_configuration() -> Configuration
{
	let mut configuration = Configuration::default();
	configuration.mesh_dim_x = 4;
	configuration.mesh_dim_y = 4;
	configuration.buffer_depth = 4;
	configuration.packet_injection_rate = 0.0;
	configuration.reset_time = 0;
	configuration.stats_warm_up_time = 0;
	configuration.random_seed = 42;
	configuration
}

pub fn build(configuration:&Configuration) -> (Network,Statistics)
{
	let statistics = Statistics::new(configuration.stats_warm_up_time,configuration.mesh_dim_x*configuration.mesh_dim_y);
	let network = Network::new(configuration,None,None);
	(network,statistics)
}

///Advance `cycles` cycles starting at `cycle`; returns the next cycle number.
pub fn drive(network:&mut Network, statistics:&mut Statistics, rng:&mut StdRng, cycle:Time, cycles:Time) -> Time
{
	for current in cycle..cycle+cycles
	{
		network.step(current,false,rng,statistics);
	}
	cycle+cycles
}

///Advance until nothing is stored or queued anywhere for ten consecutive
///cycles, which also flushes whatever was still on a wire. Panics when the
///network has not drained within `max_cycles`.
pub fn drive_until_drained(network:&mut Network, statistics:&mut Statistics, rng:&mut StdRng, cycle:Time, max_cycles:Time) -> Time
{
	let mut cycle = cycle;
	let mut idle = 0;
	while idle < 10
	{
		assert!(cycle < max_cycles,"network failed to drain within {} cycles",max_cycles);
		network.step(cycle,false,rng,statistics);
		cycle += 1;
		if network.in_flight() == 0
		{
			idle += 1;
		}
		else
		{
			idle = 0;
		}
	}
	cycle
}
