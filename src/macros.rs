/// Lets you simply create a [Labels](crate::Labels) map from `name => value` pairs. It's a bit
/// like the vec! macro.
/// ```rust
/// # #[macro_use]
/// # extern crate check_metric_value;
/// #
/// # fn main() {
/// let labels = labels!["job" => "node", "instance" => "localhost:9100"];
/// assert_eq!(labels.get("job").unwrap(), "node");
/// assert!(labels.get("mountpoint").is_err());
/// # }
/// ```
#[macro_export]
macro_rules! labels {
    ($( $name:expr => $value:expr ), * $(,)?) => {
        {
            #[allow(unused_mut)]
            let mut l = $crate::Labels::new();
            $(
                l.insert($name, $value);
            )*
            l
        }
    };
}
