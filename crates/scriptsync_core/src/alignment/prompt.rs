//! Alignment prompt construction.

/// Build the instruction text sent alongside a video.
///
/// The rules mirror what downstream assembly needs: absolute
/// timestamps, verbatim script words (the splitter anchors on fragment
/// endings), and clip pacing that leaves room for narration audio.
pub fn build_alignment_prompt(script: &str, instructions: Option<&str>) -> String {
    let mut prompt = String::from(
        "You are matching a narration script against video footage.\n\
         Identify the scenes in the video that correspond to consecutive \
         portions of the script below, in script order.\n\
         \n\
         Rules:\n\
         - Timestamps use MM:SS or HH:MM:SS format, measured from the start of THIS video.\n\
         - Each clip must be between 5 and 20 seconds long.\n\
         - Each scene's narration must contain at least 10 words.\n\
         - Leave at least 10 seconds of footage between consecutive clips.\n\
         - Use the exact words from the script for the narration field. Do not paraphrase.\n\
         - Each narration must end exactly where the script text ends, mid-sentence is not acceptable.\n\
         - If you are unsure about a scene, set its status field to \"review\".\n\
         \n\
         Respond with JSON only, no commentary, in this shape:\n\
         {\n\
           \"scenes\": [\n\
             {\"scene_number\": 1, \"start_time\": \"00:12\", \"end_time\": \"00:25\", \"narration\": \"...\"}\n\
           ],\n\
           \"notes\": \"optional observations\"\n\
         }\n\
         \n\
         SCRIPT:\n",
    );
    prompt.push_str(script.trim());

    if let Some(extra) = instructions {
        let extra = extra.trim();
        if !extra.is_empty() {
            prompt.push_str("\n\nADDITIONAL INSTRUCTIONS:\n");
            prompt.push_str(extra);
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_script_and_rules() {
        let prompt = build_alignment_prompt("The fox ran.", None);
        assert!(prompt.contains("The fox ran."));
        assert!(prompt.contains("5 and 20 seconds"));
        assert!(prompt.contains("at least 10 words"));
        assert!(!prompt.contains("ADDITIONAL INSTRUCTIONS"));
    }

    #[test]
    fn extra_instructions_are_appended() {
        let prompt = build_alignment_prompt("x", Some("Prefer daylight shots."));
        assert!(prompt.ends_with("Prefer daylight shots."));
    }

    #[test]
    fn blank_instructions_are_ignored() {
        let prompt = build_alignment_prompt("x", Some("   "));
        assert!(!prompt.contains("ADDITIONAL INSTRUCTIONS"));
    }
}
