use std::{env, fs, fs::File, io::prelude::*, path::Path};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=../flags/");

    let out_dir = env::var("OUT_DIR")?;
    let dest_flags_path = Path::new(&out_dir).join("all-flags.yaml");

    // Try multiple possible paths for the flags directory
    let possible_paths = ["../flags", "flags"];

    let flags_path = possible_paths
        .iter()
        .find(|path| Path::new(path).is_dir())
        .ok_or_else(|| {
            let msg = format!("Flags directory not found. Tried paths: {possible_paths:?}");
            std::io::Error::new(std::io::ErrorKind::NotFound, msg)
        })?;

    let mut paths: Vec<_> = fs::read_dir(flags_path)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "yaml"))
        .collect();
    paths.sort();

    let mut all_flags = String::new();
    for path in &paths {
        println!("cargo:rerun-if-changed={}", path.display());
        all_flags.push_str(&fs::read_to_string(path)?);
        all_flags.push('\n');
    }

    let mut file = File::create(dest_flags_path)?;
    file.write_all(all_flags.as_bytes())?;

    Ok(())
}
