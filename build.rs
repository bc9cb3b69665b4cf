use std::io::Write;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // For each recording in our tests/data directory, create one test function
    // that decodes the report descriptor and every event of that recording
    let datadir: PathBuf = [concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data")]
        .iter()
        .collect();
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=tests/data");

    let out_dir = std::env::var_os("OUT_DIR").unwrap();
    let dest_path = PathBuf::from(&out_dir).join("test-recordings.rs");
    let mut file = std::fs::File::create(dest_path)?;

    // The recordings are not part of the published crate
    let mut recordings: Vec<PathBuf> = match std::fs::read_dir(&datadir) {
        Ok(dir) => dir
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "hid"))
            .collect(),
        Err(_) => Vec::new(),
    };
    recordings.sort();

    for path in recordings {
        let filename = path.file_name().unwrap().to_string_lossy().into_owned();
        let funcname = filename.replace([':', '.', '-', ' '], "_");
        writeln!(
            file,
            "
#[test]
#[allow(non_snake_case)]
fn test_{funcname}() {{
    check_recording({path:?});
}}
"
        )?;
    }

    Ok(())
}
