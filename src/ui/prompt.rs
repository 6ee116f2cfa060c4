//! Yes/no gate run before any work starts.

use dialoguer::Confirm;

/// Ask each prompt in order. Returns `false` at the first "no".
pub fn confirm_all(prompts: &[String]) -> Result<bool, dialoguer::Error> {
    for prompt in prompts {
        let accepted = Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        if !accepted {
            return Ok(false);
        }
    }
    Ok(true)
}
