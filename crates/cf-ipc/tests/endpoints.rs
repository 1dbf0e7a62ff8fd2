//! Endpoint round-trips through real POSIX queues.
//!
//! Queues may be unavailable in sandboxed environments; these tests skip
//! (with a note on stderr) instead of failing when the transport cannot be
//! opened at all.

use cf_ipc::{
    DataMessage, MessageQueue, ParamsMessage, Receiver, Transmitter, DATA_QUEUE, PARAMS_QUEUE,
};
use cf_runtime::{shared, ControlParameters, PipelineSignals};

#[test]
fn parameters_flow_into_the_cell() {
    let params = shared(ControlParameters::default());
    let receiver = match Receiver::new(params.clone()) {
        Ok(rx) => rx,
        Err(e) => {
            eprintln!("skipping mq endpoint test: {e}");
            return;
        }
    };
    let gui_side = MessageQueue::open_sender(PARAMS_QUEUE).unwrap();

    // Drain anything a previous aborted run may have left queued.
    loop {
        match receiver.poll() {
            Ok(None) => break,
            _ => {}
        }
    }
    assert!(receiver.poll().unwrap().is_none());

    let msg = ParamsMessage {
        kp: 2.0,
        ki: 0.25,
        kd: 0.0,
        setpoint: 1.5,
        signal_type: 2,
        timestamp_ms: 77,
    };
    gui_side.send(&msg.to_bytes()).unwrap();

    let received = receiver.poll().unwrap().unwrap();
    assert_eq!(received, msg);

    let cell = *params.lock();
    assert_eq!(cell.kp, 2.0);
    assert_eq!(cell.ki, 0.25);
    assert_eq!(cell.setpoint, 1.5);
    assert_eq!(cell.signal_type, 2);

    drop((receiver, gui_side));
    MessageQueue::unlink(PARAMS_QUEUE).unwrap();
}

#[test]
fn telemetry_snapshot_reaches_the_gui_side() {
    let pipeline = shared(PipelineSignals {
        reference: 1.0,
        control: 0.5,
        plant_output: 0.25,
        ..Default::default()
    });

    let gui_side = match MessageQueue::open_receiver(DATA_QUEUE) {
        Ok(rx) => rx,
        Err(e) => {
            eprintln!("skipping mq endpoint test: {e}");
            return;
        }
    };
    let mut buf = [0u8; 64];
    while gui_side.try_receive(&mut buf).unwrap().is_some() {}

    let transmitter = Transmitter::new(pipeline, false).unwrap();
    transmitter.send_snapshot().unwrap();

    let len = gui_side.try_receive(&mut buf).unwrap().unwrap();
    let msg = DataMessage::from_bytes(&buf[..len]).unwrap();
    assert_eq!(msg.num_values, 3);
    assert_eq!(msg.values[0], 1.0);
    assert_eq!(msg.values[1], 0.5);
    assert_eq!(msg.values[2], 0.25);
    assert!(msg.timestamp_s >= 0.0);

    drop((transmitter, gui_side));
    MessageQueue::unlink(DATA_QUEUE).unwrap();
}
