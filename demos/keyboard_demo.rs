use inputgate::backends::virtual_input::VirtualGamepad;
use inputgate::{
    Action, BoundKey, Controller, DeviceManager, EventBus, InputConfig, RawEvent, UpdateCadence,
};

fn main() {
    env_logger::init();

    let bus = EventBus::new();
    let devices = DeviceManager::new(InputConfig::default().with_cadence(UpdateCadence::OnTick));
    devices.register_keyboard("keyboard", &bus);
    devices.register_pointer("pointer", &bus);

    let pad = VirtualGamepad::new("Demo Pad", 4, 2);
    devices.register_gamepad("gamepad", pad.clone());

    let controller = Controller::new(devices);
    controller.bind_actions([
        (
            "jump",
            Action::new([BoundKey::any(32u32), BoundKey::on("gamepad", 0u32)])
                .on_activate(|| println!("jump!"))
                .on_deactivate(|| println!("landed")),
        ),
        (
            "fire",
            Action::new([BoundKey::on("pointer", 0u32)]).on_activate(|| println!("bang")),
        ),
    ]);
    controller.attach(&bus, false);
    bus.observe(&Default::default(), |n| println!("(target) {n}"));

    // Tick 1: space tapped inside one frame still counts as a jump.
    bus.emit_all(&[RawEvent::key_down(32), RawEvent::key_up(32)]);
    controller.devices().tick();
    // Tick 2: the deferred release lands.
    controller.devices().tick();

    // Tick 3: the gamepad takes over.
    pad.connect();
    pad.press_button(0);
    controller.devices().tick();
    println!("last active: {:?}", controller.devices().last_active_device());

    pad.release_button(0);
    controller.devices().tick();

    match controller.is_action_active("dash") {
        Ok(active) => println!("dash active: {active}"),
        Err(e) => println!("query failed: {e}"),
    }
    println!("{}", controller.devices().snapshot().to_json().unwrap_or_default());
}
