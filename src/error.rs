/*!

The ways in which building a simulation can fail.

Everything here is fatal at startup: a malformed knob, an unknown algorithm
name or an unreadable table file aborts before the first cycle. Once the mesh
is running there are no recoverable errors; violated invariants panic with a
diagnostic instead.

*/

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error,Debug)]
pub enum Error
{
	///A knob has a value outside its sane range, or knobs contradict each other.
	#[error("bad configuration: {0}")]
	BadConfiguration(String),
	///A `key = value` assignment names a knob that does not exist.
	#[error("unknown configuration key `{0}`")]
	UnknownKey(String),
	#[error("unknown routing algorithm `{0}`")]
	UnknownRoutingAlgorithm(String),
	#[error("unknown selection strategy `{0}`")]
	UnknownSelectionStrategy(String),
	#[error("unknown traffic pattern `{0}`")]
	UnknownTrafficPattern(String),
	#[error("could not read `{}`: {source}", path.display())]
	FileAccess
	{
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	///A routing or traffic table file failed to parse. The offending line is reported.
	#[error("{}:{line}: malformed {table} table entry: {reason}", path.display())]
	MalformedTable
	{
		table: &'static str,
		path: PathBuf,
		line: usize,
		reason: String,
	},
}
