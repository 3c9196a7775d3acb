use std::thread;

use radx_model::{Engine, EngineConfig, PredictionRecord};
use tests::{consolidated_chest, striped_film, write_film, FILM_SIZE};

const THREADS: usize = 8;
const CALLS: usize = 25;

#[test]
fn shared_engine_serves_parallel_callers() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let chest = write_film(dir.path(), "chest.png", &consolidated_chest(FILM_SIZE));
    let hand = write_film(dir.path(), "hand.png", &striped_film(FILM_SIZE));
    let log = dir.path().join("predictions.jsonl");
    let engine = Engine::from_config(&EngineConfig::default().with_seed(21).with_prediction_log(&log)).unwrap();

    thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let (engine, chest, hand) = (&engine, &chest, &hand);
                s.spawn(move || {
                    for _ in 0..CALLS {
                        let (path, region, expected) = if i % 2 == 0 {
                            (chest, "chest", "Pneumonia")
                        } else {
                            (hand, "hand", "Fracture")
                        };
                        assert_eq!(engine.predict(path, region, Some(40), None).label(), expected);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    });

    let text = std::fs::read_to_string(&log).unwrap();
    let records: Vec<PredictionRecord> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(records.len(), THREADS * CALLS);
    let fractures = records.iter().filter(|r| r.prediction == "Fracture").count();
    assert_eq!(fractures, THREADS / 2 * CALLS);
}
