//! Integration test for generating whole layers from a catalog file

use std::fs;
use tempfile::TempDir;
use wrapgen::{Catalog, GenerationReport, Generator, Layer, WrapperStatus};

fn send_catalog() -> serde_json::Value {
    serde_json::json!({
        "procedures": [
            {
                "canonical_name": "mpi_send",
                "group": "p2p",
                "tasks": [{ "type": "TaskSend" }],
                "c": {
                    "name": "MPI_Send",
                    "return_type": "int",
                    "parameters": [
                        { "name": "buf", "type": "void", "pointer": 1, "const": true },
                        { "name": "count", "type": "int" },
                        { "name": "datatype", "type": "MPI_Datatype" },
                        { "name": "dest", "type": "int" },
                        { "name": "tag", "type": "int" },
                        { "name": "comm", "type": "MPI_Comm" }
                    ]
                },
                "f08": {
                    "name": "MPI_Send",
                    "parameters": [
                        { "name": "buf", "type": "TYPE(*)", "dims": [".."], "direction": "in", "buffer": true },
                        { "name": "count", "type": "INTEGER", "direction": "in" },
                        { "name": "datatype", "type": "TYPE(MPI_Datatype)", "direction": "in" },
                        { "name": "dest", "type": "INTEGER", "direction": "in" },
                        { "name": "tag", "type": "INTEGER", "direction": "in" },
                        { "name": "comm", "type": "TYPE(MPI_Comm)", "direction": "in" },
                        { "name": "ierror", "type": "INTEGER", "attributes": ["OPTIONAL"], "direction": "out" }
                    ]
                }
            },
            {
                "canonical_name": "mpi_pcontrol",
                "group": "misc",
                "tasks": [{ "type": "TaskDefault" }],
                "c": {
                    "name": "MPI_Pcontrol",
                    "return_type": "int",
                    "parameters": [{ "name": "level", "type": "int" }]
                }
            }
        ]
    })
}

fn load(dir: &TempDir) -> Catalog {
    let path = dir.path().join("catalog.json");
    fs::write(&path, serde_json::to_string_pretty(&send_catalog()).unwrap()).unwrap();
    Catalog::load_from_file(&path).unwrap()
}

#[test]
fn test_send_in_both_layers() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = load(&temp_dir);
    let selection = vec!["mpi_send".to_string()];

    let c = Generator::strict().generate(&catalog, Layer::C, &selection).unwrap();
    assert_eq!(c.report.status("mpi_send"), Some(WrapperStatus::Done));
    assert!(c.text.contains("MPI_Send("));
    assert!(c.text.contains("SCOREP_MpiSend( dest, local_comm_handle, tag, local_send_bytes );"));

    let f08 = Generator::strict().generate(&catalog, Layer::F08, &selection).unwrap();
    assert_eq!(f08.report.status("mpi_send"), Some(WrapperStatus::Done));
    assert!(f08.text.contains("subroutine SCOREP_F08_SYMBOL_NAME_MPI_SEND (&\n"));
    assert!(f08.text.contains("call SCOREP_MpiSend(dest, local_comm_handle, tag, local_send_bytes)"));
    assert!(f08.text.contains("end subroutine\n"));
}

#[test]
fn test_report_over_both_layers() {
    let temp_dir = TempDir::new().unwrap();
    let catalog = load(&temp_dir);

    let mut report = GenerationReport::new();
    for layer in Layer::ALL {
        let out = Generator::permissive().generate(&catalog, layer, &[]).unwrap();
        report.add_layer(layer, &out.report, &catalog);
    }

    let c = report.layer(Layer::C).unwrap();
    assert_eq!(c.done, vec!["mpi_pcontrol", "mpi_send"]);
    assert!(c.not_seen.is_empty());

    // mpi_pcontrol has no Fortran signature and becomes a placeholder.
    let f08 = report.layer(Layer::F08).unwrap();
    assert_eq!(f08.done, vec!["mpi_send"]);
    assert_eq!(f08.todo, vec!["mpi_pcontrol"]);

    let path = temp_dir.path().join("report.json");
    report.save_to_file(&path).unwrap();
    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["f08"]["not seen"], serde_json::json!([]));
    assert_eq!(saved["c"]["done"], serde_json::json!(["mpi_pcontrol", "mpi_send"]));
}
