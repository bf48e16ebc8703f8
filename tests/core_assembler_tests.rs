use npx_acquire::core::{FrameAssembler, PacketShape, RawPacket, ShapeMismatch};

fn distinct_packet(shape: PacketShape, packet_index: usize) -> RawPacket {
    let base = (packet_index * 100_000) as i32;
    let mut packet = RawPacket::new(shape);
    for (i, v) in packet.start_trigger_mut().iter_mut().enumerate() {
        *v = (packet_index * 16 + i) as u8;
    }
    for (i, v) in packet.synchronization_mut().iter_mut().enumerate() {
        *v = (packet_index * 1000 + i) as u16;
    }
    for (i, v) in packet.counters_mut().iter_mut().enumerate() {
        *v = base + i as i32;
    }
    for (i, v) in packet.lfp_data_mut().iter_mut().enumerate() {
        *v = -(base as f32) - i as f32;
    }
    for (i, v) in packet.ap_data_mut().iter_mut().enumerate() {
        *v = base as f32 + i as f32 + 0.5;
    }
    packet
}

#[test]
fn test_transpose_matches_packet_layout() {
    let shape = PacketShape::NEUROPIX_3A;
    let packet = distinct_packet(shape, 1);

    let frame = FrameAssembler::new(shape).assemble(&[packet.clone()], 0.0).unwrap();

    assert_eq!(frame.ap_data.rows(), 384);
    assert_eq!(frame.ap_data.cols(), 12);
    assert_eq!(frame.counters.rows(), 13);
    assert_eq!(frame.counters.cols(), 12);
    for sample in 0..shape.samples {
        for channel in 0..shape.channels {
            assert_eq!(*frame.ap_data.get(channel, sample).unwrap(), packet.ap(sample, channel));
        }
        for column in 0..shape.counter_columns() {
            assert_eq!(*frame.counters.get(column, sample).unwrap(), packet.counter(sample, column));
        }
    }
    assert_eq!(frame.start_trigger.as_slice(), packet.start_trigger());
    assert_eq!(frame.synchronization.as_slice(), packet.synchronization());
    assert_eq!(frame.lfp_data.as_slice(), packet.lfp_data());
}

#[test]
fn test_batched_packets_land_at_sample_offsets() {
    let shape = PacketShape::new(3, 5);
    let packets: Vec<RawPacket> = (0..4).map(|i| distinct_packet(shape, i)).collect();

    let frame = FrameAssembler::new(shape).assemble(&packets, 0.25).unwrap();

    assert_eq!(frame.packet_count(), 4);
    assert_eq!(frame.sample_count(), 12);
    assert_eq!(frame.start_trigger.cols(), 12);
    assert_eq!(frame.synchronization.cols(), 12);
    assert_eq!(frame.counters.cols(), 12);
    assert_eq!(frame.buffer_capacity, 0.25);

    for (i, packet) in packets.iter().enumerate() {
        let offset = i * shape.samples;
        for sample in 0..shape.samples {
            assert_eq!(frame.start_trigger.get(0, offset + sample), Some(&packet.start_trigger()[sample]));
            assert_eq!(frame.synchronization.get(0, offset + sample), Some(&packet.synchronization()[sample]));
            for channel in 0..shape.channels {
                assert_eq!(frame.ap_data.get(channel, offset + sample), Some(&packet.ap(sample, channel)));
            }
            for column in 0..shape.counter_columns() {
                assert_eq!(frame.counters.get(column, offset + sample), Some(&packet.counter(sample, column)));
            }
        }
    }
}

#[test]
fn test_lfp_has_one_column_per_packet() {
    let shape = PacketShape::new(2, 6);
    let packets: Vec<RawPacket> = (0..3).map(|i| distinct_packet(shape, i)).collect();

    let frame = FrameAssembler::new(shape).assemble(&packets, 0.0).unwrap();

    assert_eq!(frame.lfp_data.rows(), 6);
    assert_eq!(frame.lfp_data.cols(), 3);
    for (i, packet) in packets.iter().enumerate() {
        for channel in 0..shape.channels {
            assert_eq!(frame.lfp_data.get(channel, i), Some(&packet.lfp_data()[channel]));
        }
    }
}

#[test]
fn test_float_values_pass_through_bit_for_bit() {
    let shape = PacketShape::new(2, 2);
    let mut packet = RawPacket::new(shape);
    let odd = [f32::from_bits(0x7fc0_1234), -0.0, f32::MIN_POSITIVE / 2.0, f32::INFINITY];
    packet.ap_data_mut().copy_from_slice(&odd);

    let frame = FrameAssembler::new(shape).assemble(&[packet], 0.0).unwrap();
    let bits: Vec<u32> = frame.ap_data.as_slice().iter().map(|v| v.to_bits()).collect();

    // [[a, b], [c, d]] transposed is [[a, c], [b, d]]
    let expected: Vec<u32> = [odd[0], odd[2], odd[1], odd[3]].iter().map(|v| v.to_bits()).collect();
    assert_eq!(bits, expected);
}

#[test]
fn test_uniform_batch_accepted_mismatched_rejected() {
    let shape = PacketShape::new(12, 8);
    let assembler = FrameAssembler::new(shape);
    let uniform = vec![RawPacket::new(shape), RawPacket::new(shape)];
    assert!(assembler.assemble(&uniform, 0.0).is_ok());

    let fewer_samples = vec![RawPacket::new(shape), RawPacket::new(PacketShape::new(11, 8))];
    assert!(matches!(
        assembler.assemble(&fewer_samples, 0.0),
        Err(ShapeMismatch::Packet { index: 1, .. })
    ));

    let more_channels = vec![RawPacket::new(PacketShape::new(12, 9))];
    assert!(matches!(
        assembler.assemble(&more_channels, 0.0),
        Err(ShapeMismatch::Packet { index: 0, .. })
    ));

    assert_eq!(assembler.assemble(&[], 0.0), Err(ShapeMismatch::Empty));
}
