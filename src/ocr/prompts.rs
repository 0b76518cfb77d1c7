// @module: Recognition instructions

/// Describes the task; may be replaced through configuration
pub const DEFAULT_PROMPT: &str = "\
You are an OCR agent specialized in subtitle extraction. You receive a series of images cropped from video frames around the subtitle area. Extract ONLY the subtitle text.
The images may also contain text that belongs to the scene (signs, logos, on-screen graphics). Distinguish subtitle text from scene text: subtitles have a consistent style and placement inside the crop.
For every image, give the subtitle text it contains. If an image has no subtitle, or you cannot confidently identify any text as a subtitle, use an empty string.";

/// Fixed response contract, always appended to the task description
pub const OUTPUT_FORMAT_PROMPT: &str = r#"
IMPORTANT: Respond with a single JSON array. Each element must be a JSON object with two keys. Never merge subtitles across images: one input image gives exactly one element. Ignore image file names.
1. "image_order": position of the input image, starting from 1.
2. "extracted_text": the subtitle text as a string, "" when there is none.
Example response for 3 images, where the second image has no subtitle and the third has two lines:
```json
[
  {"image_order": 1, "extracted_text": "This is the subtitle from the first image."},
  {"image_order": 2, "extracted_text": ""},
  {"image_order": 3, "extracted_text": "This is a subtitle\nwith two lines."}
]
```
Do not add any explanation or markdown outside the JSON array.
"#;

/// Task description (custom or default) followed by the output contract
pub fn build_instructions(custom_prompt: Option<&str>) -> String {
    let task = match custom_prompt {
        Some(prompt) if !prompt.trim().is_empty() => prompt.trim(),
        _ => DEFAULT_PROMPT,
    };
    format!("{}\n\n{}", task, OUTPUT_FORMAT_PROMPT)
}

/// Request preamble stating how many images follow
pub fn batch_header(image_count: usize, instructions: &str) -> String {
    format!("Number of input images: {}\n{}", image_count, instructions)
}

/// Label placed before the image at `position` (1-based)
pub fn image_label(position: usize) -> String {
    format!("Image {}:", position)
}
