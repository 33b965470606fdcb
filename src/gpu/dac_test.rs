use crate::gpu::dac::DAC;

#[test]
fn entry_roundtrips_per_channel() {
    let mut dac = DAC::default();
    dac.set_pel_write_index(0x80);
    dac.set_pel_data(0x2A);
    dac.set_pel_data(0x15);
    dac.set_pel_data(0x3F);

    dac.set_pel_read_index(0x80);
    assert_eq!(0x2A, dac.get_pel_data());
    assert_eq!(0x15, dac.get_pel_data());
    assert_eq!(0x3F, dac.get_pel_data());
}

#[test]
fn index_advances_after_blue() {
    let mut dac = DAC::default();
    dac.set_pel_write_index(1);
    for v in &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06] {
        dac.set_pel_data(*v);
    }
    assert_eq!(3, dac.write_index);

    dac.set_pel_read_index(2);
    assert_eq!(0x04, dac.get_pel_data());
    assert_eq!(0x05, dac.get_pel_data());
    assert_eq!(0x06, dac.get_pel_data());
    assert_eq!(3, dac.read_index);
}

#[test]
fn write_index_wraps_at_255() {
    let mut dac = DAC::default();
    dac.set_pel_write_index(0xFF);
    dac.set_pel_data(0x01);
    dac.set_pel_data(0x02);
    dac.set_pel_data(0x03);
    assert_eq!(0, dac.write_index);
}

#[test]
fn six_bit_values_scale_to_eight() {
    let mut dac = DAC::default();
    dac.set_pel_write_index(7);
    dac.set_pel_data(0x3F);
    dac.set_pel_data(0x00);
    dac.set_pel_data(0x20);
    assert_eq!((0xFC, 0x00, 0x80), dac.rgb(7));
}

#[test]
fn state_register_reports_mode() {
    let mut dac = DAC::default();
    dac.set_pel_read_index(0);
    assert_eq!(0b11, dac.state.register());
    dac.set_pel_write_index(0);
    assert_eq!(0b00, dac.state.register());
}
