//! Instruction template for the checklist generator.
//!
//! One fixed template, user text embedded verbatim at the end. The template
//! asks for a bare JSON array of strings; everything downstream
//! (see [`super::sanitize`]) exists because models do not always comply.

/// Build the single-turn prompt for a raw-input string.
pub fn build_prompt(raw_input: &str) -> String {
    let mut prompt = String::with_capacity(1200 + raw_input.len());

    prompt.push_str(
        "You are an AI assistant that transforms messy, vague, or unstructured \
         thoughts into clear and highly specific to-do items.\n\n",
    );
    prompt.push_str("Your goal is to:\n");
    prompt.push_str("- Extract 5-7 concrete action steps the user can take immediately.\n");
    prompt.push_str(
        "- Make each task specific, short, and easy to understand without further explanation.\n\n",
    );
    prompt.push_str("Rules for the output:\n");
    prompt.push_str(
        "- Each item must start with a strong action verb (e.g. \"Email\", \"Buy\", \
         \"Schedule\", \"Write\", \"Call\", \"Clean\").\n",
    );
    prompt.push_str(
        "- Avoid vague terms like \"start\", \"try\", \"improve\", or \"think about\".\n",
    );
    prompt.push_str("- Focus on actions that can actually be done.\n");
    prompt.push_str("- Do not include explanations, notes, or headings.\n");
    prompt.push_str("- Respond only with a valid JSON array of strings.\n\n");
    prompt.push_str("Example Input:\n");
    prompt.push_str(
        "I need to get in shape, and my apartment is a mess. I've been meaning to \
         reconnect with John too, and I have that big team presentation coming up \
         Monday. Also, I keep forgetting to order more dog food.\n\n",
    );
    prompt.push_str("Example Output:\n");
    prompt.push_str(
        "[\n\
         \x20 \"Look up local gyms and pick one to visit this week\",\n\
         \x20 \"Buy a 15lb kettlebell and resistance bands on Amazon\",\n\
         \x20 \"Spend 30 minutes cleaning the kitchen and living room tonight\",\n\
         \x20 \"Text John to suggest catching up over coffee this weekend\",\n\
         \x20 \"Write a rough outline for Monday's team presentation\",\n\
         \x20 \"Order a 30lb bag of dog food from your usual pet store\"\n\
         ]\n\n",
    );
    prompt.push_str("Now process the following input:\n\n");
    prompt.push_str("Input:\n");
    prompt.push_str(raw_input);
    prompt.push('\n');

    prompt
}
