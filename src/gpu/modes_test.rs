use crate::gpu::modes::vga_mode_block;

#[test]
fn mode_geometry_table() {
    let modes = vga_mode_block();
    let find = |num: u8| modes.iter().find(|m| m.mode == num).unwrap();

    let m = find(0x03);
    assert_eq!((80, 25), (m.twidth, m.theight));
    assert_eq!(0xB8000, m.pstart);
    assert!(m.is_text());

    let m = find(0x04);
    assert_eq!((320, 200), (m.swidth, m.sheight));
    assert_eq!(0xB8000, m.pstart);

    let m = find(0x0D);
    assert_eq!((320, 200), (m.swidth, m.sheight));
    assert_eq!(0xA0000, m.pstart);

    let m = find(0x12);
    assert_eq!((640, 480), (m.swidth, m.sheight));
    assert_eq!((80, 30), (m.twidth, m.theight));
    assert_eq!(0xA0000, m.pstart);

    let m = find(0x13);
    assert_eq!((320, 200), (m.swidth, m.sheight));
    assert_eq!(0xA0000, m.pstart);
    assert!(!m.is_text());
}

#[test]
fn unknown_modes_are_absent() {
    let modes = vga_mode_block();
    assert!(modes.iter().find(|m| m.mode == 0x08).is_none());
    assert!(modes.iter().find(|m| m.mode == 0x40).is_none());
}
