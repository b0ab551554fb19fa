//! Frame pipeline behavior against the fake backend.

use std::time::Duration;

use approx::assert_relative_eq;
use solidframe_core::{
    BackendParts, BufferState, ClearColor, FenceSynchronizer, FrameError, FrameIndex,
    FrameRecorder, PresentationSurface, SignalValue, SubmissionController, SwapchainManager,
    Transition,
};
use solidframe_test::{Event, FakeBackend, Harness};

fn is_reset(e: &Event) -> bool {
    matches!(e, Event::Reset)
}

#[test]
fn one_frame_runs_in_pipeline_order() {
    let (mut renderer, log) = Harness::builder().build().renderer().unwrap();
    renderer.render_frame().unwrap();

    let at = |pred: &dyn Fn(&Event) -> bool| log.first(pred).unwrap();
    let reset = at(&is_reset);
    let to_rt = at(&|e: &Event| {
        matches!(e, Event::Barrier { transition, .. } if *transition == Transition::TO_RENDER_TARGET)
    });
    let clear = at(&|e: &Event| matches!(e, Event::Clear { .. }));
    let to_present = at(&|e: &Event| {
        matches!(e, Event::Barrier { transition, .. } if *transition == Transition::TO_PRESENTABLE)
    });
    let close = at(&|e: &Event| matches!(e, Event::Close));
    let execute = at(&|e: &Event| matches!(e, Event::Execute { .. }));
    let present = at(&|e: &Event| matches!(e, Event::Present { .. }));
    let signal = at(&|e: &Event| matches!(e, Event::Signal { .. }));
    let gpu_signaled = at(&|e: &Event| matches!(e, Event::GpuSignaled { value: 1 }));

    assert!(reset < to_rt);
    assert!(to_rt < clear);
    assert!(clear < to_present);
    assert!(to_present < close);
    assert!(close < execute);
    assert!(execute < present);
    assert!(present < signal);
    assert!(signal < gpu_signaled);

    // render_frame returns only once the GPU reached the frame's value
    assert_eq!(renderer.fence().completed_value().unwrap().0, 1);
}

#[test]
fn no_reset_before_previous_frame_is_confirmed() {
    let (mut renderer, log) = Harness::builder()
        .gpu_latency(Duration::from_millis(5))
        .build()
        .renderer()
        .unwrap();

    for _ in 0..4 {
        renderer.render_frame().unwrap();
    }

    let resets = log.positions(is_reset);
    assert_eq!(resets.len(), 4);
    for (k, reset) in resets.iter().enumerate().skip(1) {
        let previous = k as u64;
        let confirmed = log
            .first(|e| *e == Event::GpuSignaled { value: previous })
            .unwrap();
        assert!(
            confirmed < *reset,
            "frame {} reset before value {previous} completed",
            k + 1
        );
    }
}

#[test]
fn signal_values_increase_by_one() {
    let (mut renderer, log) = Harness::builder().build().renderer().unwrap();

    let mut reported = Vec::new();
    for _ in 0..5 {
        let report = renderer.render_frame().unwrap().unwrap();
        reported.push(report.signal.0);
    }

    assert_eq!(reported, vec![1, 2, 3, 4, 5]);
    assert_eq!(log.signals(), vec![1, 2, 3, 4, 5]);
    assert_eq!(renderer.fence().last_signaled().0, 5);
}

#[test]
fn waiting_for_a_completed_value_does_not_block() {
    let Harness { log, parts } = Harness::builder().build();
    let BackendParts::<FakeBackend> {
        surface,
        recording,
        mut queue,
        fence,
    } = parts;

    let mut swapchain = SwapchainManager::new(surface).unwrap();
    let mut recorder = FrameRecorder::new(recording);
    let mut submitter = SubmissionController::new();
    let mut fence = FenceSynchronizer::new(fence);

    let index = swapchain.current_index().unwrap();
    recorder
        .record(&fence, &mut swapchain, index, ClearColor::DEFAULT)
        .unwrap();
    let ticket = submitter.submit(&mut queue, &mut recorder).unwrap();
    let value = fence.signal_after(&mut queue, ticket).unwrap();
    fence.wait_until(value).unwrap();

    let blocked = fence.blocked_waits();
    let armed = log.count(|e| matches!(e, Event::WaitArmed { .. }));

    fence.wait_until(value).unwrap();
    assert!(fence.wait_until_timeout(value, Duration::ZERO).unwrap());

    assert_eq!(fence.blocked_waits(), blocked);
    assert_eq!(log.count(|e| matches!(e, Event::WaitArmed { .. })), armed);
}

#[test]
fn waiting_for_an_unsignaled_value_fails() {
    let Harness { parts, .. } = Harness::builder().build();
    let mut fence = FenceSynchronizer::new(parts.fence);

    let err = fence.wait_until(solidframe_core::SignalValue(1)).unwrap_err();
    assert!(matches!(err, FrameError::Synchronization(_)));
}

#[test]
fn recorder_refuses_reset_while_submission_is_unconfirmed() {
    let Harness { log, parts } = Harness::builder().build();
    let BackendParts::<FakeBackend> {
        surface,
        recording,
        mut queue,
        fence,
    } = parts;

    let mut swapchain = SwapchainManager::new(surface).unwrap();
    let mut recorder = FrameRecorder::new(recording);
    let mut submitter = SubmissionController::new();
    let mut fence = FenceSynchronizer::new(fence);
    let index = FrameIndex(0);
    queue.hold_gpu();

    recorder
        .record(&fence, &mut swapchain, index, ClearColor::DEFAULT)
        .unwrap();
    let ticket = submitter.submit(&mut queue, &mut recorder).unwrap();

    // Submitted but no fence signal yet
    let err = recorder
        .record(&fence, &mut swapchain, index, ClearColor::DEFAULT)
        .unwrap_err();
    assert!(matches!(err, FrameError::Recording(_)));

    // Signaled but still executing
    let value = fence.signal_after(&mut queue, ticket).unwrap();
    let err = recorder
        .record(&fence, &mut swapchain, index, ClearColor::DEFAULT)
        .unwrap_err();
    assert!(matches!(err, FrameError::Recording(_)));
    assert_eq!(log.count(is_reset), 1);
    assert_eq!(fence.completed_value().unwrap(), SignalValue(0));

    queue.release_gpu();
    fence.wait_until(value).unwrap();
    recorder
        .record(&fence, &mut swapchain, index, ClearColor::DEFAULT)
        .unwrap();
    assert_eq!(log.count(is_reset), 2);
}

#[test]
fn each_frame_records_two_mirrored_barriers_around_the_clear() {
    let (mut renderer, _log) = Harness::builder().build().renderer().unwrap();

    for _ in 0..3 {
        renderer.render_frame().unwrap();
        let commands = renderer.recording().commands();
        assert_eq!(commands.len(), 3);

        let (first_target, first) = match commands[0] {
            Event::Barrier { target, transition } => (target, transition),
            other => panic!("expected barrier, got {other}"),
        };
        let (clear_target, color) = match commands[1] {
            Event::Clear { target, color } => (target, color),
            other => panic!("expected clear, got {other}"),
        };
        let (last_target, last) = match commands[2] {
            Event::Barrier { target, transition } => (target, transition),
            other => panic!("expected barrier, got {other}"),
        };

        assert_eq!(first.before, BufferState::Presentable);
        assert_eq!(first.after, BufferState::RenderTarget);
        assert_eq!(last.before, first.after);
        assert_eq!(last.after, first.before);
        assert_eq!(first_target, clear_target);
        assert_eq!(clear_target, last_target);

        assert_relative_eq!(color.r, 0.0);
        assert_relative_eq!(color.g, 0.2);
        assert_relative_eq!(color.b, 0.6);
        assert_relative_eq!(color.a, 1.0);
    }
}

#[test]
fn every_buffer_is_presentable_between_frames() {
    let (mut renderer, _log) = Harness::builder().buffers(3).build().renderer().unwrap();

    for _ in 0..6 {
        renderer.render_frame().unwrap();
        let swapchain = renderer.swapchain();
        for i in 0..swapchain.buffer_count() as u32 {
            assert_eq!(
                swapchain.back_buffer(FrameIndex(i)).unwrap().state,
                BufferState::Presentable
            );
        }
    }
}

#[test]
fn scripted_indices_pick_buffers_and_values() {
    let (mut renderer, log) = Harness::builder()
        .script([0, 1, 0])
        .build()
        .renderer()
        .unwrap();

    let mut indices = Vec::new();
    for _ in 0..3 {
        let report = renderer.render_frame().unwrap().unwrap();
        indices.push(report.frame_index.0);
    }

    assert_eq!(indices, vec![0, 1, 0]);
    assert_eq!(log.signals(), vec![1, 2, 3]);
    assert_eq!(log.presents(), vec![0, 1, 0]);
    assert_eq!(renderer.submitted(), 3);
}

#[test]
fn index_one_clears_its_own_view() {
    let (mut renderer, log) = Harness::builder().script([1]).build().renderer().unwrap();
    renderer.render_frame().unwrap();

    let surface = renderer.swapchain().surface();
    let own = surface.target(FrameIndex(1)).unwrap();
    let other = surface.target(FrameIndex(0)).unwrap();

    assert_ne!(own.view, other.view);
    assert_eq!(log.executed_targets(), vec![Some(own)]);
    assert_eq!(
        log.count(|e| matches!(e, Event::Clear { target, .. } if *target == own)),
        1
    );
    assert_eq!(
        log.count(|e| matches!(e, Event::Clear { target, .. } if *target == other)),
        0
    );
}

#[test]
fn out_of_range_index_is_rejected_before_recording() {
    let (mut renderer, log) = Harness::builder().script([2]).build().renderer().unwrap();

    let err = renderer.render_frame().unwrap_err();
    assert!(matches!(
        err,
        FrameError::BufferOutOfRange { index: FrameIndex(2), count: 2 }
    ));
    assert_eq!(log.count(is_reset), 0);
}

#[test]
fn slow_gpu_makes_waits_block() {
    let (mut renderer, _log) = Harness::builder()
        .gpu_latency(Duration::from_millis(20))
        .build()
        .renderer()
        .unwrap();

    let first = renderer.render_frame().unwrap().unwrap();
    let second = renderer.render_frame().unwrap().unwrap();

    assert!(first.blocked);
    assert!(second.blocked);
    assert_eq!(renderer.stats().blocked_waits(), 2);
    assert_eq!(renderer.stats().frames(), 2);
}
