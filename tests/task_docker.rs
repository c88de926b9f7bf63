//! Integration tests against a real Docker daemon.
//!
//! These require a running Docker daemon and are marked `#[ignore]`.
//! Run with: `cargo test -- --ignored`

use dockhand::data::RawCodec;
use dockhand::docker;
use dockhand::task::ContainerTask;

#[test]
#[ignore]
fn docker_is_available() {
    assert!(docker::ensure_available("docker").is_ok());
}

#[test]
#[ignore]
fn hello_world_runs_clean() {
    let codec = RawCodec;
    let mut task = ContainerTask::new("hello-world", &codec).expect("failed to create session");
    task.auto_remove_container(true);
    let outputs = task.run().expect("hello-world should exit 0");
    assert!(outputs.is_empty());
}

#[test]
#[ignore]
fn busybox_round_trips_through_the_working_directory() {
    let codec = RawCodec;
    let mut task = ContainerTask::new("busybox:latest", &codec).expect("failed to create session");
    task.auto_remove_container(true);

    let mount = task
        .working_dir()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();

    // The container writes into the shared working directory; the session
    // picks the file up afterwards.
    task.add_app_arg("sh");
    task.add_app_arg("-c");
    task.add_app_arg(&format!("printf hi > /{mount}/greeting.txt"));
    task.expect_workdir_file("greeting.txt");

    let outputs = task.run().expect("busybox should exit 0");
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].bytes, b"hi");
}
