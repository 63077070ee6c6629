mod common;

use common::RomBuilder;
use wraith::cpu::CpuState;
use wraith::mem::Bus;
use wraith::ppu::FRAME_CYCLES;
use wraith::{Button, Buttons, EmulationError, Frame, Gameboy, Host, Pixel};

/// Counts presented frames and feeds a fixed button state.
#[derive(Default)]
struct Recorder {
    frames: usize,
    last: Option<Frame>,
    buttons: Buttons,
}

impl Host for Recorder {
    fn present(&mut self, frame: &Frame) {
        self.frames += 1;
        self.last = Some(frame.clone());
    }

    fn poll_buttons(&mut self) -> Buttons {
        self.buttons
    }
}

fn boot(program: &[u8]) -> Gameboy {
    Gameboy::new(RomBuilder::new(program).build()).unwrap()
}

fn run(gb: &mut Gameboy, steps: usize) {
    for _ in 0..steps {
        gb.step().unwrap();
    }
}

#[test_log::test]
fn serial_output() {
    // Sends "Hi" over the serial port, then spins
    let program = [
        0x3E, b'H', 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02, // LD A, 'H'; LDH ($01), A; ...
        0x3E, b'i', 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02, // LD A, 'i'; LDH ($01), A; ...
        0x18, 0xFE,
    ];
    let mut gb = boot(&program);
    run(&mut gb, 20);
    assert_eq!(gb.take_serial_output(), b"Hi");
    assert!(gb.take_serial_output().is_empty());
}

#[test_log::test]
fn timer_interrupt_wakes_halt_and_dispatches() {
    let program = [
        0x3E, 0x04, 0xE0, 0xFF, // IE = timer
        0x3E, 0xFE, 0xE0, 0x05, // TIMA = 0xFE
        0x3E, 0x05, 0xE0, 0x07, // TAC = on, every 16 cycles
        0xFB, // EI
        0x76, // HALT
        0x3E, 0x99, 0xEA, 0x01, 0xC0, // LD A, $99; LD ($C001), A
        0x18, 0xFE,
    ];
    // LD A, $42; LD ($C000), A; RETI
    let handler = [0x3E, 0x42, 0xEA, 0x00, 0xC0, 0xD9];
    let rom = RomBuilder::new(&program).at(0x50, &handler).build();
    let mut gb = Gameboy::new(rom).unwrap();
    run(&mut gb, 10);
    assert_eq!(gb.cpu().state, CpuState::Halted);
    assert_eq!(gb.bus().read(0xC000), 0x00);
    run(&mut gb, 30);
    assert_eq!(gb.bus().read(0xC000), 0x42);
    assert_eq!(gb.bus().read(0xC001), 0x99);
    assert!(gb.cpu().ime);
}

#[test_log::test]
fn halt_without_ime_resumes_without_dispatch() {
    let program = [
        0x3E, 0x01, 0xE0, 0xFF, // IE = VBlank
        0xF3, // DI
        0x76, // HALT
        0x3E, 0x77, // LD A, $77
        0x18, 0xFE,
    ];
    let mut gb = boot(&program);
    let mut host = Recorder::default();
    gb.run_frame(&mut host).unwrap();
    assert_eq!(host.frames, 1);
    run(&mut gb, 2);
    assert_eq!(gb.cpu().a, 0x77);
    // The request is still pending since nothing serviced it
    assert_eq!(gb.bus().read(0xFF0F) & 0x01, 0x01);
}

#[test_log::test]
fn halt_bug_after_ei_runs_the_handler_once() {
    let program = [
        0x3E, 0x01, 0xE0, 0xFF, // IE = VBlank
        0xE0, 0x0F, // IF = VBlank
        0x06, 0x00, // LD B, $00
        0xFB, // EI
        0x76, // HALT
        0x18, 0xFE,
    ];
    // INC B; RETI
    let rom = RomBuilder::new(&program).at(0x40, &[0x04, 0xD9]).build();
    let mut gb = Gameboy::new(rom).unwrap();
    run(&mut gb, 12);
    assert_eq!(gb.cpu().b, 1);
    // The handler returns to the HALT, which now parks the CPU
    assert_eq!(gb.cpu().state, CpuState::Halted);
    assert_eq!(gb.cpu().pc, 0x015A);
}

#[test_log::test]
fn frames_are_paced() {
    let mut gb = boot(&[0x18, 0xFE]);
    let mut host = Recorder::default();
    // The first VBlank comes 144 lines after power on
    let first = gb.run_frame(&mut host).unwrap();
    assert!((456 * 144..456 * 144 + 16).contains(&first), "{first}");
    let second = gb.run_frame(&mut host).unwrap();
    assert!(
        (FRAME_CYCLES - 16..FRAME_CYCLES + 16).contains(&second),
        "{second}"
    );
    assert_eq!(host.frames, 2);
    assert_eq!(gb.bus().ppu.ly(), 144);
    // Empty VRAM is color 0 everywhere, which the power-on BGP shows as white
    let frame = host.last.unwrap();
    assert!(frame.lines().iter().flatten().all(|p| *p == Pixel::WHITE));
}

#[test_log::test]
fn lcd_off_still_presents() {
    // XOR A; LDH ($40), A; JR -2
    let mut gb = boot(&[0xAF, 0xE0, 0x40, 0x18, 0xFE]);
    let mut host = Recorder::default();
    let elapsed = gb.run_frame(&mut host).unwrap();
    assert!(elapsed >= FRAME_CYCLES);
    assert_eq!(host.frames, 1);
    assert_eq!(gb.bus().read(0xFF44), 0);
}

#[test_log::test]
fn run_frame_applies_host_buttons() {
    // LD A, $20; LDH ($00), A; JR -2
    let mut gb = boot(&[0x3E, 0x20, 0xE0, 0x00, 0x18, 0xFE]);
    let mut host = Recorder {
        buttons: [Button::Down].into_iter().collect(),
        ..Default::default()
    };
    gb.run_frame(&mut host).unwrap();
    assert_eq!(gb.bus().read(0xFF00) & 0x0F, 0b0111);
    assert!(gb.joypad().buttons().contains(Button::Down));
}

#[test_log::test]
fn oam_dma_through_the_bus() {
    let program = [
        0x3E, 0x11, 0xEA, 0x05, 0xC1, // LD A, $11; LD ($C105), A
        0x3E, 0xC1, 0xE0, 0x46, // LD A, $C1; LDH ($46), A
        0x18, 0xFE,
    ];
    let mut gb = boot(&program);
    run(&mut gb, 100);
    assert_eq!(gb.bus().read(0xFE05), 0x11);
    assert_eq!(gb.bus().read(0xFE06), 0x00);
}

#[test_log::test]
fn armed_stop_switches_speed() {
    // LD A, $01; LDH ($4D), A; STOP; INC A; JR -2
    let program = [0x3E, 0x01, 0xE0, 0x4D, 0x10, 0x00, 0x3C, 0x18, 0xFE];
    let mut gb = Gameboy::new(RomBuilder::new(&program).color().build()).unwrap();
    run(&mut gb, 6);
    assert!(gb.bus().io.double_speed());
    assert_eq!(gb.bus().read(0xFF4D), 0xFE);
    assert_eq!(gb.cpu().a, 0x02);
}

#[test_log::test]
fn stop_does_not_switch_speed_on_the_monochrome_model() {
    // LD A, $01; LDH ($4D), A; STOP; INC A; JR -2
    let program = [0x3E, 0x01, 0xE0, 0x4D, 0x10, 0x00, 0x3C, 0x18, 0xFE];
    let mut gb = boot(&program);
    run(&mut gb, 6);
    assert!(!gb.bus().io.double_speed());
    assert_eq!(gb.bus().read(0xFF4D), 0xFF);
    assert!(gb.cpu().is_stopped());
    assert_eq!(gb.cpu().a, 0x01);
}

#[test_log::test]
fn plain_stop_waits_for_the_joypad() {
    // STOP; INC A; JR -2
    let mut gb = boot(&[0x10, 0x00, 0x3C, 0x18, 0xFE]);
    run(&mut gb, 3);
    assert!(gb.cpu().is_stopped());
    for _ in 0..10 {
        assert_eq!(gb.step(), Ok(4));
    }
    assert_eq!(gb.cpu().a, 0x01);
    gb.joypad().press(Button::Start);
    gb.step().unwrap();
    assert!(!gb.cpu().is_stopped());
    assert_eq!(gb.cpu().a, 0x02);
}

#[test]
fn illegal_opcodes_stop_the_loop() {
    let mut gb = boot(&[0xD3]);
    run(&mut gb, 2);
    assert_eq!(
        gb.step(),
        Err(EmulationError::IllegalOpcode {
            pc: 0x0150,
            opcode: 0xD3
        })
    );
    let mut gb = boot(&[0xD3]);
    let mut host = Recorder::default();
    assert!(gb.run_frame(&mut host).is_err());
    assert_eq!(host.frames, 0);
}

#[test]
fn disassembly() {
    let gb = boot(&[0x18, 0xFE]);
    assert_eq!(gb.disassemble(0x0100), "NOP");
    assert_eq!(gb.disassemble(0x0101), "JP $0150");
    assert_eq!(gb.disassemble(0x0150), "JR -2");
    assert_eq!(gb.cpu().pc, 0x0100);
}
