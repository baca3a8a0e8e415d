/*!

Table-based routing support.

The table file is plain text. Every non-empty line outside a `#` comment is

```text
<node_id> <in_dir> <dst_id> <out_dir>[,<out_dir>...]
```

with directions as the port indices 0 north, 1 east, 2 south, 3 west, 4 local.
The loader is strict: duplicate entries, unknown direction indices or an empty
output list abort the simulation before it starts.

*/

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::Direction;

///The slice of the global table a single router owns: the admissible outputs
///for each (input direction, destination) pair seen at that node.
#[derive(Clone,Debug,Default)]
pub struct NodeRoutingTable
{
	entries: HashMap<(usize,usize),Vec<Direction>>,
}

impl NodeRoutingTable
{
	pub fn admissible_outputs(&self, in_direction:Direction, destination:usize) -> Option<&[Direction]>
	{
		self.entries.get(&(in_direction.index(),destination)).map(|outputs|outputs.as_slice())
	}
	pub fn is_empty(&self) -> bool
	{
		self.entries.is_empty()
	}
}

///The whole-mesh routing lookup, loaded once at startup when the algorithm is
///table-based and then sliced per node.
#[derive(Clone,Debug,Default)]
pub struct GlobalRoutingTable
{
	nodes: HashMap<usize,NodeRoutingTable>,
}

impl GlobalRoutingTable
{
	pub fn load(path:&Path) -> Result<GlobalRoutingTable,Error>
	{
		let content = fs::read_to_string(path).map_err(|source|Error::FileAccess{ path:path.to_path_buf(), source })?;
		GlobalRoutingTable::parse(path,&content)
	}
	fn parse(path:&Path, content:&str) -> Result<GlobalRoutingTable,Error>
	{
		let mut nodes: HashMap<usize,NodeRoutingTable> = HashMap::new();
		for (index,raw) in content.lines().enumerate()
		{
			let line = raw.split('#').next().unwrap().trim();
			if line.is_empty()
			{
				continue;
			}
			let malformed = |reason:String| Error::MalformedTable{
				table: "routing",
				path: path.to_path_buf(),
				line: index+1,
				reason,
			};
			let fields: Vec<&str> = line.split_whitespace().collect();
			if fields.len() != 4
			{
				return Err(malformed(format!("expected 4 fields, found {}",fields.len())));
			}
			let node = parse_index(fields[0]).map_err(&malformed)?;
			let in_direction = parse_direction(fields[1]).map_err(&malformed)?;
			let destination = parse_index(fields[2]).map_err(&malformed)?;
			let mut outputs = Vec::new();
			for token in fields[3].split(',')
			{
				outputs.push(parse_direction(token).map_err(&malformed)?);
			}
			if outputs.is_empty()
			{
				return Err(malformed("empty admissible output set".to_string()));
			}
			let previous = nodes.entry(node).or_default().entries.insert((in_direction.index(),destination),outputs);
			if previous.is_some()
			{
				return Err(malformed(format!("duplicate entry for node {} input {} destination {}",node,in_direction,destination)));
			}
		}
		Ok(GlobalRoutingTable{ nodes })
	}
	///The slice for one router; empty when the table never mentions the node.
	pub fn node_routing_table(&self, node:usize) -> NodeRoutingTable
	{
		self.nodes.get(&node).cloned().unwrap_or_default()
	}
}

fn parse_index(token:&str) -> Result<usize,String>
{
	token.parse().map_err(|_|format!("`{}` is not a node index",token))
}

fn parse_direction(token:&str) -> Result<Direction,String>
{
	let index: usize = token.parse().map_err(|_|format!("`{}` is not a direction index",token))?;
	if index > 4
	{
		return Err(format!("`{}` is not a direction index",token));
	}
	Ok(Direction::from_index(index))
}
