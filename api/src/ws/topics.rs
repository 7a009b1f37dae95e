/// Topic carrying every fleet snapshot broadcast. There is a single
/// consolidated view, so there is a single topic.
pub fn fleet_topic() -> String {
    "fleet".to_string()
}
