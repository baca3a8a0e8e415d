use std::env;
use std::process::exit;

fn main()
{
	let args: Vec<String> = env::args().collect();
	if let Err(error) = noxim::file_main(&args)
	{
		eprintln!("{}",error);
		exit(1);
	}
}
