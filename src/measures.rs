/*!

Module encapsulating the statistics of a simulation.

The aggregator is a collaborator of the router core: routers report every
local delivery through `track_received_flit`, processing elements report
injections, and the fabric samples the global buffer occupancy once per
cycle. Events before `stats_warm_up_time` are ignored so measurements start
from a loaded network.

The values written into the final report are:
* `cycle` is the last simulated cycle.
* `injected_flits`/`injected_packets` count what the elements pushed into their routers.
* `received_flits`/`received_packets` count local deliveries.
* `average_packet_delay` averages, per delivered packet, the cycles from
creation to the arrival of its tail. The creation may predate the warm-up.
* `max_packet_delay` is the worst such delay.
* `average_packet_hops` averages the router-to-router links traversed.
* `average_throughput` is flits delivered per cycle per node over the measured span.
* `average_buffer_occupancy` is the average number of flits stored per router buffer per sampled cycle.

*/

use std::io::{self,Write};

use crate::{Flit,FlitType,Time};

///One packet completed, recorded at the arrival of its tail flit.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct PacketArrival
{
	pub cycle: Time,
	pub source: usize,
	pub destination: usize,
	///Cycles from the creation of the packet to the arrival of its tail.
	pub delay: Time,
	///Router-to-router links traversed.
	pub hops: usize,
}

pub struct Statistics
{
	///First cycle included in the aggregates.
	warm_up_time: Time,
	///Number of processing elements, for the per-node throughput.
	total_nodes: usize,
	pub injected_flits: usize,
	pub injected_packets: usize,
	pub received_flits: usize,
	pub received_packets: usize,
	total_delay: Time,
	pub max_delay: Time,
	total_hops: usize,
	///Sum over sampled cycles of the flits stored in every router buffer.
	occupancy_sum: u64,
	occupancy_samples: u64,
	buffers_per_sample: usize,
	///Every completed packet, in arrival order.
	pub packet_log: Vec<PacketArrival>,
}

impl Statistics
{
	pub fn new(warm_up_time:Time, total_nodes:usize) -> Statistics
	{
		Statistics{
			warm_up_time,
			total_nodes,
			injected_flits: 0,
			injected_packets: 0,
			received_flits: 0,
			received_packets: 0,
			total_delay: 0,
			max_delay: 0,
			total_hops: 0,
			occupancy_sum: 0,
			occupancy_samples: 0,
			buffers_per_sample: 0,
			packet_log: vec![],
		}
	}
	///Called by an element each time it pushes a flit into its router.
	pub fn track_injected_flit(&mut self, cycle:Time, flit:&Flit)
	{
		if cycle < self.warm_up_time
		{
			return;
		}
		self.injected_flits += 1;
		if flit.flit_type == FlitType::Head
		{
			self.injected_packets += 1;
		}
	}
	///Called by a router each time it delivers a flit on its local port.
	pub fn track_received_flit(&mut self, cycle:Time, flit:&Flit)
	{
		if cycle < self.warm_up_time
		{
			return;
		}
		self.received_flits += 1;
		if flit.flit_type == FlitType::Tail
		{
			let delay = cycle - flit.timestamp;
			self.received_packets += 1;
			self.total_delay += delay;
			if delay > self.max_delay
			{
				self.max_delay = delay;
			}
			self.total_hops += flit.hop_count;
			self.packet_log.push(PacketArrival{
				cycle,
				source: flit.src_id,
				destination: flit.dst_id,
				delay,
				hops: flit.hop_count,
			});
		}
	}
	///Called by the fabric once per cycle with the flits stored across all
	///router buffers and how many buffers that is.
	pub fn track_buffer_occupancy(&mut self, cycle:Time, stored_flits:usize, buffers:usize)
	{
		if cycle < self.warm_up_time
		{
			return;
		}
		self.occupancy_sum += stored_flits as u64;
		self.occupancy_samples += 1;
		self.buffers_per_sample = buffers;
	}
	pub fn average_delay(&self) -> f64
	{
		if self.received_packets == 0
		{
			0.0
		}
		else
		{
			self.total_delay as f64 / self.received_packets as f64
		}
	}
	pub fn average_hops(&self) -> f64
	{
		if self.received_packets == 0
		{
			0.0
		}
		else
		{
			self.total_hops as f64 / self.received_packets as f64
		}
	}
	///Flits delivered per cycle per node over the measured span.
	pub fn average_throughput(&self, current_cycle:Time) -> f64
	{
		let span = current_cycle.saturating_sub(self.warm_up_time);
		if span == 0 || self.total_nodes == 0
		{
			return 0.0;
		}
		self.received_flits as f64 / span as f64 / self.total_nodes as f64
	}
	///Average flits stored per router buffer per sampled cycle.
	pub fn average_buffer_occupancy(&self) -> f64
	{
		if self.occupancy_samples == 0 || self.buffers_per_sample == 0
		{
			return 0.0;
		}
		self.occupancy_sum as f64 / self.occupancy_samples as f64 / self.buffers_per_sample as f64
	}
	pub fn write_report<W:Write>(&self, out:&mut W, current_cycle:Time) -> io::Result<()>
	{
		writeln!(out,"cycle: {}",current_cycle)?;
		writeln!(out,"injected_flits: {}",self.injected_flits)?;
		writeln!(out,"injected_packets: {}",self.injected_packets)?;
		writeln!(out,"received_flits: {}",self.received_flits)?;
		writeln!(out,"received_packets: {}",self.received_packets)?;
		writeln!(out,"average_packet_delay: {:.5}",self.average_delay())?;
		writeln!(out,"max_packet_delay: {}",self.max_delay)?;
		writeln!(out,"average_packet_hops: {:.5}",self.average_hops())?;
		writeln!(out,"average_throughput: {:.5}",self.average_throughput(current_cycle))?;
		writeln!(out,"average_buffer_occupancy: {:.5}",self.average_buffer_occupancy())?;
		Ok(())
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn tail(timestamp:Time, hop_count:usize) -> Flit
	{
		Flit{
			src_id: 0,
			dst_id: 1,
			flit_type: FlitType::Tail,
			sequence_number: 1,
			timestamp,
			hop_count,
		}
	}

	#[test]
	fn packet_aggregates_follow_the_tail()
	{
		let mut statistics = Statistics::new(0,16);
		statistics.track_received_flit(10,&tail(0,6));
		statistics.track_received_flit(30,&tail(10,2));
		assert_eq!(statistics.received_packets,2);
		assert_eq!(statistics.max_delay,20);
		assert!((statistics.average_delay()-15.0).abs() < 1e-9);
		assert!((statistics.average_hops()-4.0).abs() < 1e-9);
		assert_eq!(statistics.packet_log.len(),2);
		assert_eq!(statistics.packet_log[0].delay,10);
	}

	#[test]
	fn warm_up_filters_events()
	{
		let mut statistics = Statistics::new(100,16);
		statistics.track_received_flit(50,&tail(0,6));
		statistics.track_buffer_occupancy(50,10,80);
		assert_eq!(statistics.received_packets,0);
		assert_eq!(statistics.average_buffer_occupancy(),0.0);
		statistics.track_received_flit(150,&tail(0,6));
		assert_eq!(statistics.received_packets,1);
	}
}
