//! Postmortem dumps for failed scenarios.

use std::{fs, path::Path};

use gauntlet_scenario::StagingLayout;

/// Print each staged node configuration and each node's captured stderr.
///
/// Emitted when a scenario fails and the run has `dump_error_details`
/// set, to aid postmortem without re-running the cluster.
pub fn dump_error_details(layout: &StagingLayout, data_dir: &Path) {
    for (index, node_dir) in layout.iter().enumerate() {
        dump_file(&node_dir.join("config.ini"));
        dump_file(&data_dir.join(format!("node_{index:02}")).join("stderr.log"));
    }
    dump_file(&data_dir.join("wallet").join("stderr.log"));
}

fn dump_file(path: &Path) {
    println!("=== {} ===", path.display());
    match fs::read_to_string(path) {
        Ok(contents) => println!("{contents}"),
        Err(e) => println!("(unavailable: {e})"),
    }
}
