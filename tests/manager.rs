mod common;

mod tests {
    use std::{
        sync::{Arc, mpsc},
        thread,
        time::Duration as StdDuration,
    };

    use myrtio_keylight::{EffectManager, EngineConfig, Error, GridSize, TickOutcome};

    use super::common::{
        Behavior, GateEffect, Journal, JournalEffect, RED, RecordingSink, ScriptedInput,
        StallEffect, TestEffect, at, custom_library, manager, manager_with_config,
        threaded_manager,
    };

    #[test]
    fn test_tick_is_idle_until_an_effect_is_set() {
        let (effect, log) = TestEffect::new("a", Behavior::Fill(RED));
        let (manager, sink, _input) = manager(custom_library(vec![Box::new(effect)]));

        assert_eq!(manager.tick_at(at(0)), TickOutcome::Idle);
        assert!(sink.log().frames.is_empty());
        assert_eq!(log.lock().unwrap().updates, 0);
        assert_eq!(manager.active_effect(), None);
    }

    #[test]
    fn test_set_effect_renders_to_sink() {
        let (effect, log) = TestEffect::new("a", Behavior::Fill(RED));
        let (manager, sink, _input) = manager(custom_library(vec![Box::new(effect)]));

        manager.set_effect("a").unwrap();
        assert_eq!(manager.active_effect(), Some("a"));
        assert!(manager.is_running());
        assert_eq!(manager.tick_at(at(16)), TickOutcome::Rendered);

        let frame = sink.last_frame().unwrap();
        assert_eq!(frame.size(), GridSize::new(6, 17));
        assert!(frame.as_slice().iter().all(|&cell| cell == RED));
        assert_eq!(sink.log().presents, 1);

        let log = log.lock().unwrap();
        assert_eq!(log.initializations, 1);
        assert_eq!(log.last_size, GridSize::new(6, 17));
    }

    #[test]
    fn test_unknown_effect_is_rejected() {
        let (effect, _log) = TestEffect::new("a", Behavior::Fill(RED));
        let (manager, _sink, _input) = manager(custom_library(vec![Box::new(effect)]));

        assert!(matches!(
            manager.set_effect("missing"),
            Err(Error::UnknownEffect(name)) if name == "missing"
        ));
        assert_eq!(manager.active_effect(), None);
    }

    #[test]
    fn test_switching_cleans_up_previous_effect() {
        let (first, first_log) = TestEffect::new("a", Behavior::Fill(RED));
        let (second, second_log) = TestEffect::new("b", Behavior::Fill(RED));
        let (manager, _sink, _input) =
            manager(custom_library(vec![Box::new(first), Box::new(second)]));

        manager.set_effect("a").unwrap();
        manager.tick_at(at(0));
        manager.set_effect("b").unwrap();
        manager.tick_at(at(16));

        assert_eq!(first_log.lock().unwrap().cleanups, 1);
        assert_eq!(first_log.lock().unwrap().updates, 1);
        assert_eq!(second_log.lock().unwrap().initializations, 1);
        assert_eq!(second_log.lock().unwrap().updates, 1);
        assert_eq!(manager.active_effect(), Some("b"));
    }

    #[test]
    fn test_switch_cleans_up_before_next_initialize() {
        let journal = Journal::default();
        let library = custom_library(vec![
            Box::new(JournalEffect::new("a", &journal)),
            Box::new(JournalEffect::new("b", &journal)),
        ]);
        let (manager, _sink, _input) = manager(library);

        manager.set_effect("a").unwrap();
        manager.tick_at(at(0));
        manager.set_effect("b").unwrap();
        manager.tick_at(at(16));

        assert_eq!(
            *journal.lock().unwrap(),
            ["a:initialize", "a:update", "a:cleanup", "b:initialize", "b:update"]
        );
    }

    #[test]
    fn test_repeated_failures_disable_effect() {
        let (effect, log) = TestEffect::new("broken", Behavior::Fail);
        let (manager, sink, _input) = manager(custom_library(vec![Box::new(effect)]));

        manager.set_effect("broken").unwrap();
        assert_eq!(manager.tick_at(at(0)), TickOutcome::Failed { failures: 1 });
        assert_eq!(manager.tick_at(at(16)), TickOutcome::Failed { failures: 2 });
        assert_eq!(manager.tick_at(at(32)), TickOutcome::Disabled);
        assert_eq!(manager.tick_at(at(48)), TickOutcome::Idle);

        assert!(sink.log().frames.is_empty());
        assert_eq!(sink.log().resets, 1);
        assert_eq!(log.lock().unwrap().cleanups, 1);
        assert_eq!(log.lock().unwrap().updates, 3);
        assert_eq!(manager.active_effect(), None);
        assert!(!manager.is_running());

        // An explicit switch may bring it back
        manager.set_effect("broken").unwrap();
        assert_eq!(log.lock().unwrap().initializations, 2);
        assert_eq!(manager.tick_at(at(64)), TickOutcome::Failed { failures: 1 });
    }

    #[test]
    fn test_panicking_update_is_contained() {
        let (effect, log) = TestEffect::new("panics", Behavior::Panic);
        let (manager, sink, _input) = manager(custom_library(vec![Box::new(effect)]));

        manager.set_effect("panics").unwrap();
        assert_eq!(manager.tick_at(at(0)), TickOutcome::Failed { failures: 1 });
        assert_eq!(manager.tick_at(at(16)), TickOutcome::Failed { failures: 2 });
        assert_eq!(manager.tick_at(at(32)), TickOutcome::Disabled);

        assert!(sink.log().frames.is_empty());
        assert_eq!(log.lock().unwrap().cleanups, 1);
        assert_eq!(manager.active_effect(), None);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let (effect, _log) = TestEffect::new("flaky", Behavior::FailOn(&[1, 2, 4, 5]));
        let (manager, sink, _input) = manager(custom_library(vec![Box::new(effect)]));

        manager.set_effect("flaky").unwrap();
        let outcomes: Vec<TickOutcome> = (0..5).map(|i| manager.tick_at(at(i * 16))).collect();
        assert_eq!(
            outcomes,
            [
                TickOutcome::Failed { failures: 1 },
                TickOutcome::Failed { failures: 2 },
                TickOutcome::Rendered,
                TickOutcome::Failed { failures: 1 },
                TickOutcome::Failed { failures: 2 },
            ]
        );
        assert_eq!(manager.active_effect(), Some("flaky"));
        assert_eq!(sink.log().frames.len(), 1);
    }

    #[test]
    fn test_failure_limit_from_config() {
        let config = EngineConfig {
            max_consecutive_failures: 1,
            ..EngineConfig::default()
        };
        let (effect, _log) = TestEffect::new("broken", Behavior::Fail);
        let (manager, _sink, _input) =
            manager_with_config(custom_library(vec![Box::new(effect)]), &config);

        manager.set_effect("broken").unwrap();
        assert_eq!(manager.tick_at(at(0)), TickOutcome::Disabled);
    }

    #[test]
    fn test_failed_initialize_leaves_engine_idle() {
        let (effect, log) = TestEffect::new("a", Behavior::Fill(RED));
        let effect = effect.failing_initialize();
        let (manager, sink, _input) = manager(custom_library(vec![Box::new(effect)]));

        let result = manager.set_effect("a");
        assert!(matches!(result, Err(Error::Effect { effect, .. }) if effect == "a"));
        assert_eq!(manager.active_effect(), None);
        assert_eq!(manager.tick_at(at(0)), TickOutcome::Idle);
        assert_eq!(sink.log().resets, 1);
        assert_eq!(log.lock().unwrap().updates, 0);
    }

    #[test]
    fn test_stop_cleans_up_and_resets_sink() {
        let (effect, log) = TestEffect::new("a", Behavior::Fill(RED));
        let (manager, sink, _input) = manager(custom_library(vec![Box::new(effect)]));

        manager.set_effect("a").unwrap();
        manager.tick_at(at(0));
        manager.stop();

        assert_eq!(manager.tick_at(at(16)), TickOutcome::Idle);
        assert_eq!(manager.active_effect(), None);
        assert_eq!(log.lock().unwrap().cleanups, 1);
        assert_eq!(sink.log().resets, 1);
    }

    #[test]
    fn test_sink_not_ready() {
        let (effect, _log) = TestEffect::new("a", Behavior::Fill(RED));
        let manager = EffectManager::new(
            RecordingSink::broken(),
            ScriptedInput::default(),
            custom_library(vec![Box::new(effect)]),
            &EngineConfig::default(),
        )
        .unwrap();

        assert!(matches!(manager.initialize(), Err(Error::NotReady)));
        assert!(matches!(manager.set_effect("a"), Err(Error::NotReady)));
        assert!(matches!(manager.start(), Err(Error::NotReady)));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let (effect, log) = TestEffect::new("a", Behavior::Fill(RED));
        let (manager, sink, input) = manager(custom_library(vec![Box::new(effect)]));

        manager.set_effect("a").unwrap();
        manager.shutdown();
        manager.shutdown();

        assert_eq!(sink.log().shutdowns, 1);
        assert_eq!(input.shutdowns(), 1);
        assert_eq!(log.lock().unwrap().cleanups, 1);
        assert_eq!(manager.tick_at(at(0)), TickOutcome::Idle);
        assert!(matches!(manager.set_effect("a"), Err(Error::NotReady)));

        drop(manager);
        assert_eq!(sink.log().shutdowns, 1);
    }

    #[test]
    fn test_drop_shuts_down() {
        let (effect, _log) = TestEffect::new("a", Behavior::Fill(RED));
        let (manager, sink, input) = manager(custom_library(vec![Box::new(effect)]));

        drop(manager);
        assert_eq!(sink.log().shutdowns, 1);
        assert_eq!(input.shutdowns(), 1);
    }

    #[test]
    fn test_device_change_reinitializes_active_effect() {
        let (effect, log) = TestEffect::new("a", Behavior::Fill(RED));
        let (manager, sink, _input) = manager(custom_library(vec![Box::new(effect)]));

        manager.set_effect("a").unwrap();
        sink.resize(GridSize::new(4, 10));
        assert_eq!(manager.device_changed().unwrap(), GridSize::new(4, 10));
        assert_eq!(manager.grid_size(), GridSize::new(4, 10));

        assert_eq!(log.lock().unwrap().initializations, 2);
        assert_eq!(log.lock().unwrap().last_size, GridSize::new(4, 10));

        manager.tick_at(at(0));
        assert_eq!(sink.last_frame().unwrap().size(), GridSize::new(4, 10));
    }

    #[test]
    fn test_device_change_while_idle_only_updates_size() {
        let (effect, log) = TestEffect::new("a", Behavior::Fill(RED));
        let (manager, sink, _input) = manager(custom_library(vec![Box::new(effect)]));

        sink.resize(GridSize::new(2, 3));
        manager.device_changed().unwrap();
        assert_eq!(log.lock().unwrap().initializations, 0);

        manager.set_effect("a").unwrap();
        assert_eq!(log.lock().unwrap().last_size, GridSize::new(2, 3));
    }

    #[test]
    fn test_tick_is_skipped_while_engine_is_busy() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let library = custom_library(vec![Box::new(GateEffect::new(entered_tx, release_rx))]);
        let (manager, _sink, _input) = manager(library);
        manager.set_effect("gate").unwrap();

        let manager = Arc::new(manager);
        let worker = {
            let manager = Arc::clone(&manager);
            thread::spawn(move || manager.device_changed())
        };

        // The worker now holds the engine inside the effect's initialize
        entered_rx.recv().unwrap();
        assert_eq!(manager.tick_now(), TickOutcome::Skipped);

        release_tx.send(()).unwrap();
        worker.join().unwrap().unwrap();
        assert_eq!(manager.tick_now(), TickOutcome::Rendered);
    }

    #[test]
    fn test_ticks_overlapping_an_update_are_dropped() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let (effect, updates) = StallEffect::new(entered_tx, release_rx);
        let (manager, sink, _input) = manager(custom_library(vec![Box::new(effect)]));
        manager.set_effect("stall").unwrap();

        let manager = Arc::new(manager);
        let worker = {
            let manager = Arc::clone(&manager);
            thread::spawn(move || manager.tick_at(at(0)))
        };

        // The worker is stuck inside update for several periods
        entered_rx.recv().unwrap();
        for period in 1..=4 {
            thread::sleep(StdDuration::from_millis(5));
            assert_eq!(manager.tick_at(at(period * 16)), TickOutcome::Skipped);
        }
        assert_eq!(*updates.lock().unwrap(), 1);

        release_tx.send(()).unwrap();
        assert_eq!(worker.join().unwrap(), TickOutcome::Rendered);
        assert_eq!(*updates.lock().unwrap(), 1);
        assert_eq!(sink.log().frames.len(), 1);
    }

    #[test]
    fn test_set_effect_spawns_the_ticker() {
        let config = EngineConfig {
            frame_period_ms: 1,
            ..EngineConfig::default()
        };
        let (effect, log) = TestEffect::new("a", Behavior::Fill(RED));
        let (manager, sink, _input) =
            threaded_manager(custom_library(vec![Box::new(effect)]), &config);

        manager.set_effect("a").unwrap();
        thread::sleep(StdDuration::from_millis(50));
        assert!(manager.is_running());
        assert!(!sink.log().frames.is_empty());

        manager.shutdown();
        assert_eq!(log.lock().unwrap().updates, sink.log().frames.len());
    }

    #[test]
    fn test_manual_ticks_leave_frames_to_the_caller() {
        let config = EngineConfig {
            frame_period_ms: 1,
            manual_ticks: true,
            ..EngineConfig::default()
        };
        let (effect, _log) = TestEffect::new("a", Behavior::Fill(RED));
        let (manager, sink, _input) =
            threaded_manager(custom_library(vec![Box::new(effect)]), &config);

        manager.set_effect("a").unwrap();
        thread::sleep(StdDuration::from_millis(20));
        assert!(sink.log().frames.is_empty());
        assert_eq!(manager.tick_now(), TickOutcome::Rendered);
    }

    #[test]
    fn test_ticker_thread_renders_initial_effect() {
        let config = EngineConfig {
            frame_period_ms: 1,
            initial_effect: Some("a".to_owned()),
            ..EngineConfig::default()
        };
        let (effect, log) = TestEffect::new("a", Behavior::Fill(RED));
        let (manager, sink, _input) =
            manager_with_config(custom_library(vec![Box::new(effect)]), &config);

        manager.start().unwrap();
        assert_eq!(manager.active_effect(), Some("a"));
        thread::sleep(StdDuration::from_millis(100));
        manager.shutdown();

        let frames = sink.log().frames.len();
        assert!(frames > 0);
        assert_eq!(log.lock().unwrap().updates, frames);
        assert_eq!(log.lock().unwrap().cleanups, 1);

        // Nothing renders after shutdown
        thread::sleep(StdDuration::from_millis(10));
        assert_eq!(sink.log().frames.len(), frames);
    }
}
