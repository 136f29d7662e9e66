// System prompt for turning an utterance into a single navigation command

const RESPONSE_FORMAT: &str = r#"Return JSON format:
{
  "action": "<one of the available actions>",
  "entity": "object_name",
  "parameters": {"duration": 5.0, "smooth": true}
}"#;

const EXAMPLES: &str = r#"EXAMPLES:

Navigation:
"go to mars" -> {"action": "go_to", "entity": "Mars"}
"take me to jupiter" -> {"action": "go_to", "entity": "Jupiter"}
"travel to the sun" -> {"action": "go_to", "entity": "Sun"}
"jump instantly to venus" -> {"action": "go_to", "entity": "Venus", "parameters": {"smooth": false}}

Landing and tracking:
"land on the moon" -> {"action": "land_on", "entity": "Moon"}
"touch down on europa" -> {"action": "land_on", "entity": "Europa"}
"follow jupiter" -> {"action": "track", "entity": "Jupiter"}
"explore venus" -> {"action": "explore", "entity": "Venus"}
"orbit saturn slowly" -> {"action": "orbit", "entity": "Saturn", "parameters": {"speed": 0.5}}

Camera and photography:
"take a photo" -> {"action": "take_screenshot", "entity": ""}
"zoom in" -> {"action": "zoom_in", "entity": ""}
"speed up time" -> {"action": "speed_up", "entity": ""}
"set the date to 1969" -> {"action": "set_time", "entity": "", "parameters": {"year": 1969}}

Recovery:
"free camera" -> {"action": "free_camera", "entity": ""}
"get unstuck" -> {"action": "free_camera", "entity": ""}
"stop camera" -> {"action": "stop_camera", "entity": ""}
"back to space" -> {"action": "back_to_space", "entity": ""}

Tours:
"tour the solar system" -> {"action": "tour", "entity": "solar system"}
"grand tour of planets" -> {"action": "tour", "entity": "planets"}
"cinematic journey to mars" -> {"action": "cinematic_journey", "entity": "Mars"}
"stream tour of jupiter moons" -> {"action": "stream_tour", "entity": "jupiter moons"}

Multi-step:
"visit mars then land on it" -> {"action": "multi_step", "entity": "Mars", "parameters": {"steps": [{"action": "go_to", "entity": "Mars"}, {"action": "land_on", "entity": "Mars"}]}}
"fly to saturn and take screenshot" -> {"action": "multi_step", "entity": "Saturn", "parameters": {"steps": [{"action": "go_to", "entity": "Saturn"}, {"action": "take_screenshot", "entity": ""}]}}"#;

/// Build the parser's system prompt from the supported actions and known objects
pub fn command_parser_prompt(actions: &[&str], entities: &[&str]) -> String {
    format!(
        "You are a space navigation command parser. Extract navigation commands from natural language.\n\n\
         Available actions: {}\n\
         Common entities: {}\n\n\
         {}\n\n\
         {}\n\n\
         Only return the JSON, nothing else.",
        actions.join(", "),
        entities.join(", "),
        RESPONSE_FORMAT,
        EXAMPLES
    )
}
